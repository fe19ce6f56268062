// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::path::PathBuf;

use anyhow::{Result, bail};

/// The signed-in account's own details.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub staff_no: String,
    pub name: String,
    pub department: String,
    pub designation: String,
    pub contacts: Vec<String>,
    pub photo_url: Option<String>,
}

/// Editable copy of a [`Profile`]. Contacts are typed as one
/// comma-separated line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileForm {
    pub name: String,
    pub department: String,
    pub designation: String,
    pub contacts: String,
    pub photo: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: String,
    pub department: String,
    pub designation: String,
    pub contacts: Vec<String>,
    pub photo: Option<PathBuf>,
}

impl ProfileForm {
    pub fn from_profile(profile: &Profile) -> Self {
        Self {
            name: profile.name.clone(),
            department: profile.department.clone(),
            designation: profile.designation.clone(),
            contacts: profile.contacts.join(", "),
            photo: String::new(),
        }
    }

    pub fn validate(&self) -> Result<ProfileUpdate> {
        let name = self.name.trim();
        if name.is_empty() {
            bail!("Name is required");
        }
        let photo = self.photo.trim();
        let photo = (!photo.is_empty()).then(|| PathBuf::from(photo));
        if let Some(path) = &photo
            && !path.is_file()
        {
            bail!("photo {} does not exist -- pick an image file and retry", path.display());
        }
        Ok(ProfileUpdate {
            name: name.to_owned(),
            department: self.department.trim().to_owned(),
            designation: self.designation.trim().to_owned(),
            contacts: split_contacts(&self.contacts),
            photo,
        })
    }
}

fn split_contacts(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|contact| !contact.is_empty())
        .map(str::to_owned)
        .collect()
}

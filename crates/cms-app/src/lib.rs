// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod backend;
pub mod chat;
pub mod draft;
pub mod forms;
pub mod ids;
pub mod model;
pub mod profile;
pub mod queue;
pub mod schedule;
pub mod session;
pub mod state;
pub mod tracking;
pub mod wizard;

pub use backend::*;
pub use chat::*;
pub use draft::*;
pub use forms::*;
pub use ids::*;
pub use model::*;
pub use profile::*;
pub use queue::*;
pub use schedule::*;
pub use session::*;
pub use state::*;
pub use tracking::*;
pub use wizard::*;

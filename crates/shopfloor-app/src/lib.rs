// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod bridge;
pub mod forms;
pub mod ids;
pub mod model;
pub mod routing;
pub mod state;
pub mod table;
pub mod timestamp;

pub use bridge::*;
pub use forms::*;
pub use ids::*;
pub use model::*;
pub use routing::*;
pub use state::*;
pub use table::*;

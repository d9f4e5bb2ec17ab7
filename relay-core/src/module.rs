//! Module trait: register routes into Application.

use crate::application::Application;
use crate::CoreError;

/// Module: a controller that registers its routes into the app.
pub trait Module {
    fn register_into(&mut self, app: &mut Application) -> Result<(), CoreError>;
}

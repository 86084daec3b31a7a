pub mod app;
pub mod config;
pub mod logging;
pub mod render;
pub mod request_file;
pub mod template;

pub use config::AppConfig;
pub use render::{RenderError, XlsxRenderer};
pub use request_file::{RequestFile, RequestFileError};
pub use template::TemplateRenderer;

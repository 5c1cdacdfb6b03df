pub mod presenter;

pub use presenter::{OverlayPresenter, Presentation};

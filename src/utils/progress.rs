//! Spinner shown while a folder is indexed in-process.
//! Becomes a no-op when the `progress` feature is disabled.

use std::time::Duration;

#[cfg(feature = "progress")]
pub use indicatif::ProgressBar;

#[cfg(not(feature = "progress"))]
pub use self::noop::ProgressBar;

/// Start a ticking spinner with `message`
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    apply_style(&pb);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

#[cfg(feature = "progress")]
fn apply_style(pb: &ProgressBar) {
    if let Ok(style) = indicatif::ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")
    {
        pb.set_style(style);
    }
}

#[cfg(not(feature = "progress"))]
fn apply_style(_pb: &ProgressBar) {}

#[cfg(not(feature = "progress"))]
mod noop {
    use std::borrow::Cow;
    use std::time::Duration;

    #[derive(Clone)]
    pub struct ProgressBar;

    impl ProgressBar {
        pub fn new_spinner() -> Self {
            ProgressBar
        }

        pub fn set_message(&self, _msg: impl Into<Cow<'static, str>>) {}
        pub fn enable_steady_tick(&self, _interval: Duration) {}
        pub fn finish_and_clear(&self) {}
    }
}

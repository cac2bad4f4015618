use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

/// Batch progress, counted in files.
pub struct Bar {
    bar: ProgressBar,
}

impl Bar {
    pub fn new(total: u64, description: &str) -> Result<Self> {
        let bar = ProgressBar::new(total);
        let style = ProgressStyle::default_bar().template("{prefix} [{bar:40.cyan/blue}] {pos}/{len} files {msg}")?.progress_chars("●○ ");

        bar.set_style(style);
        bar.set_prefix(description.to_owned());

        Ok(Self { bar })
    }

    pub fn add(&self, delta: u64) {
        self.bar.inc(delta);
    }

    pub fn set_message(&self, msg: &str) {
        self.bar.set_message(msg.to_owned());
    }

    pub fn finish(&self) {
        self.bar.finish_with_message("Done");
    }
}

impl Drop for Bar {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish();
        }
    }
}

use tracing::debug;
use xtal::engine::progress::{Progress, ProgressCallback};

/// Turns workflow progress events into stderr lines when running verbosely.
#[derive(Debug, Clone, Copy)]
pub struct CliProgressHandler {
    verbose: bool,
}

impl CliProgressHandler {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let handler = *self;
        Box::new(move |progress: Progress| {
            if let Some(line) = handler.render(&progress) {
                eprintln!("{}", line);
            }
        })
    }

    fn render(&self, progress: &Progress) -> Option<String> {
        match progress {
            Progress::PhaseStart { name } => {
                debug!("Phase started: {}", name);
                None
            }
            Progress::PhaseFinish => {
                debug!("Phase finished.");
                None
            }
            Progress::Message(text) if self.verbose => Some(text.clone()),
            Progress::Message(_) => None,
        }
    }
}

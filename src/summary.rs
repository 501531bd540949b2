#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Summary {
    AllSucceeded,
    Partial { failed: usize, total: usize },
    AllFailed,
}

impl Summary {
    pub fn from_counts(failed: usize, total: usize) -> Self {
        if failed == 0 {
            Summary::AllSucceeded
        } else if failed < total {
            Summary::Partial { failed, total }
        } else {
            Summary::AllFailed
        }
    }

    pub fn log(&self) {
        match self {
            Summary::AllSucceeded => log::info!("All downloads completed successfully."),
            Summary::Partial { failed, total } => {
                log::warn!("Completed with {} of {} downloads failing.", failed, total)
            }
            Summary::AllFailed => log::error!("All downloads failed."),
        }
    }
}

pub mod config;
pub mod document;
pub mod driver;
pub mod error;
pub mod lrc;
pub mod override_timer;
pub mod pagination;
pub mod paths;
pub mod playback;
pub mod resolver;
pub mod scorebook;
pub mod session;
pub mod time;
pub mod viewport;

pub use config::{
    LayoutConfig, LoggingConfig, PagingConfig, PlaybackConfig, ScoreBookConfig, CONFIG_TEMPLATE,
};

pub use document::{LyricDocument, LyricLine};
pub use driver::{DriverCommand, DriverHandle, ScoreBookDriver};
pub use error::{CoreError, Result};
pub use lrc::{LrcFile, LrcLine, LrcMetadata, LrcWord};
pub use override_timer::{ManualOverrideState, ManualOverrideTimer, DEFAULT_OVERRIDE_TIMEOUT};
pub use pagination::{find_page_for_line, paginate, PageRange};
pub use paths::{config_dir, config_path, log_file_path, CONFIG_DIR_NAME, CONFIG_FILE_NAME};
pub use playback::{PlaybackClock, PlaybackStatus};
pub use resolver::{resolve, LineCursor};
pub use scorebook::{Direction, PageTurn, ScoreBook, ScoreBookState, TurnReason};
pub use session::Session;
pub use time::DurationExt;
pub use viewport::{LayoutMetrics, Viewport};

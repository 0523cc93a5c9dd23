mod app_state;
mod settings;

pub use app_state::{default_data_dir, RunnerState, DATA_DIR_ENV};
pub use settings::{load_settings_from_disk, save_settings, ResolverSettings, SETTINGS_FILE};

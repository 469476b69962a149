use std::path::PathBuf;

use slideview_core::config::ViewerConfig;

/// Results sent back from file dialogs running on their own threads.
pub enum DialogResult {
    OpenImage { path: PathBuf },
    SaveCrop { path: PathBuf },
    ExportTiles { path: PathBuf },
    ImportTiles { path: PathBuf },
    ConfigImported { config: ViewerConfig },
    ConfigExported { path: PathBuf },
    Error { message: String },
}

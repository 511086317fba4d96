use std::sync::Arc;

use fete_db::Store;

use crate::media::MediaHost;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub store: Arc<dyn Store>,
    /// `None` when Cloudinary credentials are not configured.
    pub media: Option<Arc<dyn MediaHost>>,
    pub jwt_secret: String,
}

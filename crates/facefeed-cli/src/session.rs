use crate::config::Config;
use facefeed_core::{
    Collection, Dispatch, Dispatcher, HtmlGallery, Notification, NotificationSink,
    ReconcileEngine, ToastStack,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Toast stack that also prints every notification to stdout.
pub struct TerminalToasts {
    pub stack: ToastStack,
}

impl NotificationSink for TerminalToasts {
    fn notify(&mut self, notification: Notification) {
        println!("{}", toast_line(&notification));
        self.stack.notify(notification);
    }
}

pub fn toast_line(n: &Notification) -> String {
    format!("[{}] {} | {}", n.severity, n.title, n.message)
}

/// Live gallery state for one `watch` or `replay` run.
pub struct GallerySession {
    dispatcher: Dispatcher<HtmlGallery, TerminalToasts>,
    snapshot: Option<PathBuf>,
    handled: usize,
}

impl GallerySession {
    pub fn new(config: &Config) -> Self {
        let engine = ReconcileEngine::new(HtmlGallery::new()).with_capacity(config.gallery_capacity);
        let toasts = TerminalToasts {
            stack: ToastStack::new(config.toast_ttl, config.toast_limit),
        };
        Self {
            dispatcher: Dispatcher::new(engine, toasts),
            snapshot: config.snapshot_path.clone(),
            handled: 0,
        }
    }

    pub fn with_snapshot(mut self, path: Option<PathBuf>) -> Self {
        if path.is_some() {
            self.snapshot = path;
        }
        self
    }

    /// Apply one stream payload, then refresh the snapshot file.
    pub fn handle(&mut self, payload: &str) -> Dispatch {
        let result = self.dispatcher.handle_message(payload);
        self.handled += 1;
        self.dispatcher.sink_mut().stack.expire(Instant::now());

        if let Some(path) = &self.snapshot {
            if let Err(err) = write_atomic(path, &self.page_html()) {
                tracing::warn!(path = %path.display(), error = %err, "failed to write gallery snapshot");
            }
        }
        result
    }

    pub fn handled(&self) -> usize {
        self.handled
    }

    pub fn gallery(&self) -> &HtmlGallery {
        self.dispatcher.engine().surface()
    }

    /// One line per collection: name, size and ids front to back.
    pub fn summary(&self) -> String {
        let index = self.dispatcher.engine().index();
        Collection::ALL
            .iter()
            .map(|&c| {
                let ids: Vec<String> = index.ids(c).map(|id| id.to_string()).collect();
                format!("{c}: {} [{}]", index.len_of(c), ids.join(", "))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Standalone HTML page with toasts and both gallery containers.
    pub fn page_html(&self) -> String {
        format!(
            concat!(
                "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>facefeed</title></head>\n",
                "<body>\n{toasts}\n{gallery}</body></html>\n"
            ),
            toasts = self.dispatcher.sink().stack.to_html(),
            gallery = self.gallery().to_html(),
        )
    }
}

/// Write via a sibling temp file so readers never see a half-written page.
pub fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    {
        let mut file = std::fs::File::create(&tmp)?;
        file.write_all(contents.as_bytes())?;
        file.sync_all()?;
    }
    std::fs::rename(&tmp, path)
}

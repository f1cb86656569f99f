use anyhow::{Result, bail};
use url::Url;

use crate::app::source::{is_document_link, read_document};
use crate::app::{App, Message, Model, ToastLevel};
use crate::document::is_list_document;
use crate::viewer::ViewerEvent;

impl App {
    pub(super) fn handle_message_side_effects(model: &mut Model, msg: &Message) {
        match msg {
            Message::Back => go_back(model),
            Message::ForceReload => {
                let Some(url) = model.document_url.clone() else {
                    return;
                };
                match open_document(model, url.clone()) {
                    Ok(()) => model.show_toast(ToastLevel::Info, "Reloaded"),
                    Err(err) => {
                        model.show_toast(ToastLevel::Error, format!("Reload failed: {err}"));
                        crate::perf::log_event("reload.error", format!("url={url} err={err}"));
                    }
                }
            }
            _ => {}
        }
    }

    pub(super) fn handle_viewer_event(model: &mut Model, event: ViewerEvent) {
        match event {
            ViewerEvent::BrowseTo(url) => browse_to(model, url),
            ViewerEvent::Tapped => model.toggle_chrome(),
        }
    }
}

/// Read the document at `url` and load it into the model's viewer.
pub(super) fn open_document(model: &mut Model, url: Url) -> Result<()> {
    let raw = read_document(&url)?;
    if !is_list_document(&raw) {
        bail!("Not a list document: {url}");
    }
    model.load_document(url, &raw)?;
    Ok(())
}

fn browse_to(model: &mut Model, url: Url) {
    if is_document_link(&url) {
        let previous = model.document_url.clone();
        match open_document(model, url.clone()) {
            Ok(()) => {
                model.history.extend(previous);
                model.show_toast(ToastLevel::Info, format!("Opened {url}"));
                return;
            }
            Err(err) => {
                tracing::debug!(%url, error = %err, "link is not a list document");
                crate::perf::log_event("browse.fallback", format!("url={url} err={err}"));
            }
        }
    }

    match open_external_link(url.as_str()) {
        Ok(()) => model.show_toast(ToastLevel::Info, format!("Opened {url}")),
        Err(err) => model.show_toast(ToastLevel::Error, format!("Open failed: {err}")),
    }
}

fn go_back(model: &mut Model) {
    let Some(url) = model.history.pop() else {
        model.show_toast(ToastLevel::Info, "No previous document");
        return;
    };
    if let Err(err) = open_document(model, url.clone()) {
        model.show_toast(ToastLevel::Error, format!("Open failed: {err}"));
        crate::perf::log_event("back.error", format!("url={url} err={err}"));
    }
}

fn open_external_link(url: &str) -> std::io::Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()?
            .wait()?;
        Ok(())
    }
    #[cfg(target_os = "windows")]
    {
        use std::process::Stdio;
        std::process::Command::new("cmd")
            .args(["/C", "start", "", url])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        return Ok(());
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()?
            .wait()?;
        Ok(())
    }
}

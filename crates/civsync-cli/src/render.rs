//! Plain-text rendering of page and detail views.

use civsync_core::view::{FileDetailView, ModelCard, ModelDetailView, PageView};
use civsync_core::{CivsyncError, InstallStatus};

fn status_badge(status: InstallStatus) -> &'static str {
    match status {
        InstallStatus::Installed => "[installed]",
        InstallStatus::Outdated => "[outdated] ",
        InstallStatus::NotInstalled => "           ",
    }
}

fn card_line(card: &ModelCard) -> String {
    let mut line = format!(
        "{} {:>8}  {:<38} {:<10}",
        status_badge(card.status),
        card.model_id,
        card.title,
        card.content_type
    );
    if let Some(base) = &card.base_model {
        line.push_str(&format!(" {}", base));
    }
    if let Some(creator) = &card.creator {
        line.push_str(&format!(" by {}", creator));
    }
    if card.nsfw {
        line.push_str(" (nsfw)");
    }
    line
}

pub fn page(view: &PageView, by_date: bool) -> String {
    let mut out = String::new();
    if by_date {
        for group in view.grouped_by_date() {
            let heading = group
                .date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "Undated".to_string());
            out.push_str(&format!("== {} ==\n", heading));
            for card in &group.cards {
                out.push_str(&card_line(card));
                out.push('\n');
            }
        }
    } else {
        for card in &view.cards {
            out.push_str(&card_line(card));
            out.push('\n');
        }
    }

    let prev = if view.has_prev { "<prev " } else { "" };
    let next = if view.has_next { " next>" } else { "" };
    out.push_str(&format!(
        "{}page {} of {} reached{}",
        prev, view.current_page, view.max_page, next
    ));
    if let Some(total) = view.total_items {
        out.push_str(&format!(" ({} models)", total));
    }
    out
}

pub fn file(view: &FileDetailView) -> String {
    let mut out = format!("File:      {}\n", view.label);
    out.push_str(&format!("Name:      {}\n", view.file_name));
    if let Some(sha) = &view.sha256 {
        out.push_str(&format!("SHA256:    {}\n", sha));
    }
    if view.installed {
        out.push_str(&format!("Installed: {}\n", view.folder.display()));
    } else {
        out.push_str(&format!(
            "Install to: {} as {}\n",
            view.install_path.display(),
            view.suggested_filename
        ));
    }
    out.push_str(&format!(
        "Sub-folder: {}\n",
        view.relative_subfolder.as_deref().unwrap_or("None")
    ));

    let actions = &view.actions;
    out.push_str(&format!(
        "Actions:   {} [{}]  Delete [{}]",
        actions.install_label,
        if actions.install_enabled { "enabled" } else { "disabled" },
        if actions.delete_enabled { "enabled" } else { "disabled" },
    ));
    out
}

pub fn detail(view: &ModelDetailView) -> String {
    let mut out = format!(
        "{}  [{}] {}\n",
        view.selector,
        view.content_type,
        status_badge(view.status).trim()
    );
    if let Some(creator) = &view.creator {
        out.push_str(&format!("Creator:   {}\n", creator));
    }
    if !view.tags.is_empty() {
        out.push_str(&format!("Tags:      {}\n", view.tags.join(", ")));
    }
    out.push_str(&format!("Versions:  {}\n", view.version_labels.join(" | ")));
    out.push_str(&format!("Selected:  {}\n", view.selected_version_label));
    if let Some(base) = &view.base_model {
        out.push_str(&format!("Base:      {}\n", base));
    }
    if !view.trained_words.is_empty() {
        out.push_str(&format!("Prompt:    {}\n", view.trained_words));
    }
    if view.file.file_labels.len() > 1 {
        out.push_str(&format!("Files:     {}\n", view.file.file_labels.join(" | ")));
    }
    out.push_str(&file(&view.file));
    out
}

/// Message shown in place of results.
pub fn error(err: &CivsyncError) -> String {
    format!("{} ({})", err.user_message(), err.error_kind())
}

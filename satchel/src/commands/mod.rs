use anyhow::{bail, Result};
use console::style;
use satchel_core::library::{
    Library, NoteUpdate, PreviewQuality, SortDirection, SortKey, Theme, ViewMode,
};
use std::io::Write;
use tracing::info;
use uuid::Uuid;

use crate::cli::{
    ConfigArgs, ConfigCommands, FavoriteArgs, ImportArgs, ListArgs, RecentArgs, RmArgs,
    SearchArgs, ShowArgs, TagArgs,
};

// --- Handler functions ---

pub async fn handle_import(args: ImportArgs, library: &mut Library) -> Result<()> {
    println!("Importing {} ...", args.path.display());

    let mut last_printed = 0u32;
    library
        .import_directory_with_progress(&args.path, |progress| {
            let pct = progress as u32;
            if pct >= last_printed + 10 || pct == 100 {
                last_printed = pct;
                print!("\r  scanning... {pct:3}%");
                let _ = std::io::stdout().flush();
            }
        })
        .await?;
    println!();

    info!("Import of {} completed", args.path.display());
    println!(
        "Imported. Library now holds {} notes in {} folders.",
        library.notes().len(),
        library.folders().len()
    );
    Ok(())
}

pub async fn handle_list(args: ListArgs, library: &Library) -> Result<()> {
    if args.favorites {
        println!("{}", style("Favorites").bold());
        for note in library.favorites() {
            println!("  {}  {}", style("*").yellow(), note.path);
        }
        return Ok(());
    }

    let folder = match &args.folder {
        Some(path) => match library.folder_by_path(path) {
            Some(folder) => Some(folder.clone()),
            None => bail!("No folder with path '{}'", path),
        },
        None => None,
    };
    let folder_id = folder.as_ref().map(|f| f.id);

    let crumbs = library.folder_path(folder_id);
    let trail: Vec<&str> = crumbs.iter().map(|c| c.name.as_str()).collect();
    println!("{}", style(trail.join(" / ")).bold());

    for sub in library.folders().iter().filter(|f| f.parent_id == folder_id) {
        println!("  {}/", style(&sub.name).blue());
    }
    for note in library.notes_in(folder_id) {
        let marker = if note.favorite { "*" } else { " " };
        println!("  {} {}", style(marker).yellow(), note.title);
    }
    Ok(())
}

pub async fn handle_search(args: SearchArgs, library: &Library) -> Result<()> {
    let mut results = library.search(&args.query, args.category.into());
    if let Some(limit) = args.limit {
        results.truncate(limit);
    }

    if results.is_empty() {
        println!("No matches for '{}'.", args.query);
        return Ok(());
    }
    for result in results {
        println!(
            "  {:>5.1}  {:?}  {}",
            result.score,
            result.kind,
            style(&result.path).bold()
        );
    }
    Ok(())
}

pub async fn handle_show(args: ShowArgs, library: &mut Library) -> Result<()> {
    let id = resolve_note(library, &args.note)?;
    // Viewing counts as recent use.
    library.touch_recent(id).await;

    let Some(note) = library.full_content(id).await else {
        bail!("No note with id {}", id);
    };
    println!("{}", style(&note.title).bold());
    println!("  Id:        {}", note.id);
    println!("  Path:      {}", note.path);
    println!("  Type:      {:?} ({})", note.kind, note.kind.mime());
    println!("  Modified:  {} ms since epoch", note.last_modified);
    println!("  Favorite:  {}", note.favorite);
    if let Some(size) = note.size {
        println!("  Size:      {size} bytes");
    }
    if !note.tags.is_empty() {
        println!("  Tags:      {}", note.tags.join(", "));
    }
    match &note.content {
        Some(payload) => println!("  Payload:   {} chars stored", payload.len()),
        None => println!("  Payload:   unavailable"),
    }
    Ok(())
}

pub async fn handle_favorite(args: FavoriteArgs, library: &mut Library) -> Result<()> {
    let id = resolve_note(library, &args.note)?;
    library.toggle_favorite(id).await;
    let favorite = library.note(id).map(|n| n.favorite).unwrap_or(false);
    println!(
        "{} is {} a favorite.",
        args.note,
        if favorite { "now" } else { "no longer" }
    );
    Ok(())
}

pub async fn handle_recent(_args: RecentArgs, library: &Library) -> Result<()> {
    println!("{}", style("Recently used").bold());
    for note in library.recent_notes() {
        println!("  {}", note.path);
    }
    Ok(())
}

pub async fn handle_tag(args: TagArgs, library: &mut Library) -> Result<()> {
    let id = resolve_note(library, &args.note)?;
    library
        .update_note(
            id,
            NoteUpdate {
                tags: Some(args.tags.clone()),
                ..NoteUpdate::default()
            },
        )
        .await;
    println!("Tagged {} with [{}].", args.note, args.tags.join(", "));
    Ok(())
}

pub async fn handle_rm(args: RmArgs, library: &mut Library) -> Result<()> {
    if let Ok(id) = resolve_note(library, &args.target) {
        library.delete_note(id).await;
        println!("Deleted note {}.", args.target);
        return Ok(());
    }
    if let Some(folder) = library.folder_by_path(&args.target) {
        let id = folder.id;
        library.delete_folder(id).await;
        println!("Deleted folder {} and its direct notes.", args.target);
        return Ok(());
    }
    bail!("No note or folder matches '{}'", args.target)
}

pub async fn handle_config(args: ConfigArgs, library: &mut Library) -> Result<()> {
    match args.command {
        ConfigCommands::Show => {
            let s = library.settings();
            println!("theme              {:?}", s.theme);
            println!("sort-by            {:?}", s.sort_by);
            println!("sort-direction     {:?}", s.sort_direction);
            println!("view-mode          {:?}", s.view_mode);
            println!("show-hidden-files  {}", s.show_hidden_files);
            println!("show-extensions    {}", s.show_extensions);
            println!("preview-quality    {:?}", s.preview_quality);
            println!("cache-size         {} MB", s.cache_size);
            println!("enable-indexing    {}", s.enable_indexing);
            println!("auto-save-interval {} s", s.auto_save_interval);
            println!("debug-mode         {}", s.debug_mode);
        }
        ConfigCommands::Set { key, value } => {
            let mut settings = library.settings().clone();
            apply_setting(&mut settings, &key, &value)?;
            library.set_settings(settings).await;
            println!("Set {key} = {value}.");
        }
    }
    Ok(())
}

fn apply_setting(
    settings: &mut satchel_core::library::Settings,
    key: &str,
    value: &str,
) -> Result<()> {
    match key {
        "theme" => {
            settings.theme = match value {
                "light" => Theme::Light,
                "dark" => Theme::Dark,
                _ => bail!("theme must be 'light' or 'dark'"),
            }
        }
        "sort-by" => {
            settings.sort_by = match value {
                "name" => SortKey::Name,
                "date" => SortKey::Date,
                "type" => SortKey::Type,
                "size" => SortKey::Size,
                _ => bail!("sort-by must be one of name, date, type, size"),
            }
        }
        "sort-direction" => {
            settings.sort_direction = match value {
                "asc" => SortDirection::Asc,
                "desc" => SortDirection::Desc,
                _ => bail!("sort-direction must be 'asc' or 'desc'"),
            }
        }
        "view-mode" => {
            settings.view_mode = match value {
                "grid" => ViewMode::Grid,
                "list" => ViewMode::List,
                _ => bail!("view-mode must be 'grid' or 'list'"),
            }
        }
        "preview-quality" => {
            settings.preview_quality = match value {
                "low" => PreviewQuality::Low,
                "medium" => PreviewQuality::Medium,
                "high" => PreviewQuality::High,
                _ => bail!("preview-quality must be one of low, medium, high"),
            }
        }
        "show-hidden-files" => settings.show_hidden_files = parse_bool(value)?,
        "show-extensions" => settings.show_extensions = parse_bool(value)?,
        "enable-indexing" => settings.enable_indexing = parse_bool(value)?,
        "debug-mode" => settings.debug_mode = parse_bool(value)?,
        "cache-size" => settings.cache_size = value.parse()?,
        "auto-save-interval" => settings.auto_save_interval = value.parse()?,
        _ => bail!("Unknown setting '{}'", key),
    }
    Ok(())
}

fn parse_bool(value: &str) -> Result<bool> {
    match value {
        "true" | "on" | "yes" => Ok(true),
        "false" | "off" | "no" => Ok(false),
        _ => bail!("expected a boolean ('true' or 'false')"),
    }
}

/// Resolves a note argument as a UUID first, then as a library path.
fn resolve_note(library: &Library, arg: &str) -> Result<Uuid> {
    if let Ok(id) = Uuid::try_parse(arg) {
        if library.note(id).is_some() {
            return Ok(id);
        }
        bail!("No note with id {}", id);
    }
    match library.note_by_path(arg) {
        Some(note) => Ok(note.id),
        None => bail!("No note with path '{}'", arg),
    }
}

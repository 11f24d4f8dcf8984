// UI layer: interactive terminal menus built on `dialoguer`. The menus only
// collect input and print the `ViewState` snapshot; every request goes
// through `Console`, which re-lists after each change.

use crate::draft::{EditMode, FormDraft, RecordDraft};
use crate::files::{FileUpload, StorageTarget};
use crate::reconciler::{Console, ViewState};
use crate::types::{DummyRecord, NewUser};
use anyhow::Result;
use dialoguer::{Confirm, Input, Password, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main loop. Shows the signed-out or signed-in menu depending on the
/// session and returns when the user picks "Exit".
pub async fn main_menu(console: &Console) -> Result<()> {
    if let Err(e) = console.mount().await {
        println!("Could not load data: {}", e);
    }
    loop {
        let keep_going = if console.is_authenticated().await {
            signed_in_menu(console).await?
        } else {
            signed_out_menu(console).await?
        };
        if !keep_going {
            break;
        }
    }
    Ok(())
}

async fn signed_out_menu(console: &Console) -> Result<bool> {
    let items = ["Login", "Register", "Exit"];
    let selection = Select::new().items(&items).default(0).interact()?;
    match selection {
        0 => handle_login(console).await?,
        1 => handle_register(console).await?,
        _ => return Ok(false),
    }
    Ok(true)
}

async fn signed_in_menu(console: &Console) -> Result<bool> {
    let items = [
        "Show records",
        "Create record",
        "Edit record",
        "Delete record",
        "Files",
        "Refresh",
        "Logout",
        "Exit",
    ];
    let selection = Select::new().items(&items).default(0).interact()?;
    match selection {
        0 => print_records(&console.state().await),
        1 => handle_record_form(console, FormDraft::new()).await?,
        2 => {
            if let Some(record) = pick_record(console, "Record to edit").await? {
                handle_record_form(console, FormDraft::edit(&record)).await?;
            }
        }
        3 => handle_delete_record(console).await?,
        4 => files_menu(console).await?,
        5 => report(console.refresh_all().await, "Refreshed"),
        6 => report(console.logout().await, "Logged out"),
        _ => return Ok(false),
    }
    Ok(true)
}

async fn handle_login(console: &Console) -> Result<()> {
    let username: String = Input::new().with_prompt("Username").interact_text()?;
    let password: String = Password::new().with_prompt("Password").interact()?;

    let pb = spinner("Logging in...")?;
    let result = console.login(&username, &password).await;
    pb.finish_and_clear();

    match result {
        Ok(()) => println!("Welcome {}!", username),
        Err(e) => println!("Login failed: {}", e),
    }
    Ok(())
}

async fn handle_register(console: &Console) -> Result<()> {
    let username: String = Input::new().with_prompt("Username").interact_text()?;
    let email: String = Input::new()
        .with_prompt("Email")
        .allow_empty(true)
        .interact_text()?;
    let full_name: String = Input::new()
        .with_prompt("Full name")
        .allow_empty(true)
        .interact_text()?;
    let password: String = Password::new().with_prompt("Password").interact()?;

    let pb = spinner("Registering...")?;
    let result = console
        .register(&NewUser::new(username, email, full_name, password))
        .await;
    pb.finish_and_clear();

    match result {
        Ok(()) => println!("Registered successfully, please login."),
        Err(e) => println!("Register failed: {}", e),
    }
    Ok(())
}

/// Collects the fields for a create or an edit and submits them.
async fn handle_record_form(console: &Console, mut draft: FormDraft) -> Result<()> {
    let current = draft.fields.clone();
    draft.fields = RecordDraft {
        name: prompt_field("Name", &current.name, false)?,
        description: prompt_field("Description", &current.description, false)?,
        optional_field: prompt_field("Optional field", &current.optional_field, true)?,
    };

    let verb = match draft.mode {
        EditMode::Creating => "Creating",
        EditMode::Editing(_) => "Updating",
    };
    let pb = spinner(&format!("{verb} record..."))?;
    let result = console.submit(&mut draft).await;
    pb.finish_and_clear();

    match result {
        Ok(saved) => {
            println!("Saved:");
            print_record(&saved);
        }
        Err(e) => println!("Save failed: {}", e),
    }
    Ok(())
}

fn prompt_field(prompt: &str, initial: &str, optional: bool) -> Result<String> {
    let value = Input::<String>::new()
        .with_prompt(prompt)
        .with_initial_text(initial)
        .allow_empty(optional)
        .interact_text()?;
    Ok(value)
}

async fn handle_delete_record(console: &Console) -> Result<()> {
    let Some(record) = pick_record(console, "Record to delete").await? else {
        return Ok(());
    };
    let confirmed = Confirm::new()
        .with_prompt(format!("Delete {:?}?", record.name))
        .interact()?;
    if confirmed {
        report(console.delete_record(record.id).await, "Deleted");
    }
    Ok(())
}

async fn pick_record(console: &Console, prompt: &str) -> Result<Option<DummyRecord>> {
    let state = console.state().await;
    if state.records.is_empty() {
        println!("No dummies available.");
        return Ok(None);
    }
    let labels: Vec<String> = state
        .records
        .iter()
        .map(|r| format!("#{} {}", r.id, r.name))
        .collect();
    let index = Select::new()
        .with_prompt(prompt)
        .items(&labels)
        .default(0)
        .interact_opt()?;
    Ok(index.map(|i| state.records[i].clone()))
}

async fn files_menu(console: &Console) -> Result<()> {
    let targets = ["Local storage", "Object storage"];
    let Some(index) = Select::new()
        .with_prompt("Storage")
        .items(&targets)
        .default(0)
        .interact_opt()?
    else {
        return Ok(());
    };
    let target = StorageTarget::ALL[index];

    let items = ["Show files", "Upload", "Download", "Delete", "Back"];
    let selection = Select::new().items(&items).default(0).interact()?;
    match selection {
        0 => print_files(&console.state().await, target),
        1 => {
            let path: String = Input::new().with_prompt("File path").interact_text()?;
            match FileUpload::from_path(Path::new(&path)) {
                Ok(file) => {
                    let pb = spinner("Uploading...")?;
                    let result = console.upload(target, &file).await;
                    pb.finish_and_clear();
                    report(result, "Upload successful");
                }
                Err(e) => println!("Upload failed: {}", e),
            }
        }
        2 => {
            if let Some(name) = pick_file(console, target).await? {
                let pb = spinner("Downloading...")?;
                let result = console.download(target, &name).await;
                pb.finish_and_clear();
                match result {
                    Ok(content) => {
                        let dir = dirs::download_dir().unwrap_or_else(|| PathBuf::from("."));
                        match save_download(&dir, &name, &content) {
                            Ok(path) => {
                                println!("Saved {} bytes to {}", content.len(), path.display())
                            }
                            Err(e) => println!("Download failed: {}", e),
                        }
                    }
                    Err(e) => println!("Download failed: {}", e),
                }
            }
        }
        3 => {
            if let Some(name) = pick_file(console, target).await? {
                report(console.delete_file(target, &name).await, "Deleted");
            }
        }
        _ => {}
    }
    Ok(())
}

async fn pick_file(console: &Console, target: StorageTarget) -> Result<Option<String>> {
    let state = console.state().await;
    let files = state.files(target);
    if files.is_empty() {
        println!("No files in {} storage.", target);
        return Ok(None);
    }
    let index = Select::new().items(files).default(0).interact_opt()?;
    Ok(index.map(|i| files[i].clone()))
}

/// Writes a downloaded file into `dir` under the last component of `name`.
fn save_download(dir: &Path, name: &str, content: &[u8]) -> std::io::Result<PathBuf> {
    let file_name = Path::new(name)
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("download"));
    let path = dir.join(file_name);
    std::fs::write(&path, content)?;
    Ok(path)
}

fn print_records(state: &ViewState) {
    if state.records.is_empty() {
        println!("No dummies available.");
    }
    for record in &state.records {
        print_record(record);
    }
    if let Some(err) = &state.last_error {
        println!("Last error: {}", err);
    }
}

fn print_record(record: &DummyRecord) {
    println!("  ID: {}", record.id);
    println!("  Name: {}", record.name);
    println!("  Description: {}", record.description);
    if let Some(optional) = &record.optional_field {
        println!("  Optional Field: {}", optional);
    }
}

fn print_files(state: &ViewState, target: StorageTarget) {
    let files = state.files(target);
    if files.is_empty() {
        println!("No files in {} storage.", target);
    }
    for name in files {
        println!("  {}", name);
    }
}

fn report<E: std::fmt::Display>(result: std::result::Result<(), E>, ok: &str) {
    match result {
        Ok(()) => println!("{}", ok),
        Err(e) => println!("Failed: {}", e),
    }
}

fn spinner(message: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_download_keeps_only_the_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_download(dir.path(), "../nested/report.pdf", b"%PDF").unwrap();
        assert_eq!(path, dir.path().join("report.pdf"));
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF");
    }

    #[test]
    fn save_download_into_missing_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone");
        assert!(save_download(&missing, "a.txt", b"x").is_err());
    }
}

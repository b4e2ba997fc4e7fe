//! Folder synchronization command.

use std::path::Path;

use driveinvite_providers::google::DriveClient;
use driveinvite_providers::{FileOutcome, FolderSynchronizer, RemoteDirectory, SyncReport};

use crate::config::AppConfig;
use crate::error::ClientResult;

/// Uploads `folder` into a Drive folder with the same base name.
pub async fn run(folder: &Path, parent: Option<String>, config: &AppConfig) -> ClientResult<()> {
    let session = super::open_session(config)?;
    let drive = DriveClient::new(session.clone(), session.config())?;
    let parent = parent.unwrap_or_else(|| config.drive.parent_id.clone());

    let report = synchronize(&drive, folder, &parent).await?;
    print_report(&report);
    Ok(())
}

pub(crate) async fn synchronize(
    remote: &dyn RemoteDirectory,
    folder: &Path,
    parent: &str,
) -> ClientResult<SyncReport> {
    let synchronizer = FolderSynchronizer::new(remote).with_parent(parent);
    Ok(synchronizer.sync_directory(folder).await?)
}

/// Prints one line per file, then the folder link.
pub(crate) fn print_report(report: &SyncReport) {
    for line in report_lines(report) {
        println!("{}", line);
    }
}

/// Per-file outcomes followed by the folder notice. No totals are shown.
fn report_lines(report: &SyncReport) -> Vec<String> {
    let mut lines: Vec<String> = report
        .files
        .iter()
        .map(|file| outcome_line(&file.name, &file.outcome))
        .collect();

    lines.push(match report.folder_link() {
        Some(link) => format!("Folder '{}': {}", report.folder.name, link),
        None => format!("Folder '{}' ({})", report.folder.name, report.folder_id()),
    });
    lines
}

fn outcome_line(name: &str, outcome: &FileOutcome) -> String {
    match outcome {
        FileOutcome::Created(node) => format!("uploaded  {} ({})", name, node.id),
        FileOutcome::Updated(node) => format!("updated   {} ({})", name, node.id),
        FileOutcome::Failed { stage, error } => {
            format!("failed    {} ({}: {})", name, stage, error.message())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driveinvite_providers::{FileReport, ProviderError, RemoteNode, SyncStage};
    use std::path::PathBuf;

    #[test]
    fn outcome_lines() {
        let created = FileOutcome::Created(RemoteNode::file("x1", "a.txt"));
        assert_eq!(outcome_line("a.txt", &created), "uploaded  a.txt (x1)");

        let updated = FileOutcome::Updated(RemoteNode::file("x2", "b.txt"));
        assert_eq!(outcome_line("b.txt", &updated), "updated   b.txt (x2)");

        let failed = FileOutcome::Failed {
            stage: SyncStage::Upload,
            error: ProviderError::server("boom"),
        };
        assert_eq!(outcome_line("c.txt", &failed), "failed    c.txt (upload: boom)");
    }

    #[test]
    fn report_has_no_totals() {
        let report = SyncReport {
            folder: RemoteNode::folder("F1", "proj").with_link("https://drive/F1"),
            files: vec![
                FileReport {
                    name: "a.txt".to_string(),
                    path: PathBuf::from("/tmp/proj/a.txt"),
                    outcome: FileOutcome::Created(RemoteNode::file("x1", "a.txt")),
                },
                FileReport {
                    name: "b.txt".to_string(),
                    path: PathBuf::from("/tmp/proj/b.txt"),
                    outcome: FileOutcome::Failed {
                        stage: SyncStage::Upload,
                        error: ProviderError::server("boom"),
                    },
                },
            ],
        };

        assert_eq!(
            report_lines(&report),
            vec![
                "uploaded  a.txt (x1)".to_string(),
                "failed    b.txt (upload: boom)".to_string(),
                "Folder 'proj': https://drive/F1".to_string(),
            ]
        );
    }
}

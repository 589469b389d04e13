use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::logging;
use crate::render::render_issue_content;
use crate::sanitize::clean_folder_name;
use crate::youtrack::{Attachment, Issue, YouTrackClient, YouTrackError};

/// Everything the export loop needs, passed in explicitly so runs are
/// reproducible under test fixtures.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub project: String,
    pub root: PathBuf,
    pub id_pad_width: usize,
    pub replace_spaces: bool,
    pub space_replacement: String,
    pub full_refresh: bool,
}

impl ExportConfig {
    pub fn from_app_config(cfg: &AppConfig, full_refresh: bool) -> Self {
        Self {
            project: cfg.youtrack.project.clone(),
            root: PathBuf::from(&cfg.export.root),
            id_pad_width: cfg.export.id_pad_width,
            replace_spaces: cfg.export.replace_spaces,
            space_replacement: cfg.export.space_replacement.clone(),
            full_refresh,
        }
    }
}

#[derive(Debug, Default)]
pub struct ExportReport {
    pub issues_processed: usize,
    pub issues_skipped: usize,
    pub attachments_downloaded: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    YouTrack(#[from] YouTrackError),
    #[error("attachment transfer failed: {0}")]
    Transfer(#[from] reqwest::Error),
    #[error("filesystem write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Materializes every issue of the configured project under the export
/// root. A folder that already exists is skipped wholesale unless
/// `full_refresh` is set; a non-success listing response ends the run
/// without touching the filesystem.
pub fn export_project(
    client: &YouTrackClient,
    cfg: &ExportConfig,
) -> Result<ExportReport, ExportError> {
    let mut report = ExportReport::default();

    let issues = match client.list_issues(&cfg.project) {
        Ok(issues) => issues,
        Err(YouTrackError::Http { status, body }) => {
            logging::error(format!("failed to fetch issues ({status}): {body}"));
            return Ok(report);
        }
        Err(err) => return Err(err.into()),
    };

    for issue in &issues {
        let target = cfg.root.join(issue_folder_name(issue, cfg));

        if !cfg.full_refresh && target.exists() {
            logging::info(format!(
                "skipping {} as it already exists",
                target.display()
            ));
            report.issues_skipped += 1;
            continue;
        }

        logging::info(format!("processing {}", target.display()));
        logging::debug(format!(
            "issue {} created={:?} comments={} attachments={}",
            issue.id_readable,
            issue.created,
            issue.comments.len(),
            issue.attachments.len()
        ));

        fs::create_dir_all(&target)?;
        fs::write(target.join("content.txt"), render_issue_content(issue))?;
        report.attachments_downloaded +=
            download_attachments(client, &issue.attachments, &target)?;
        report.issues_processed += 1;
    }

    Ok(report)
}

fn issue_folder_name(issue: &Issue, cfg: &ExportConfig) -> String {
    format!(
        "{}-{:0width$}-{}",
        issue.project.short_name,
        issue.number_in_project,
        clean_folder_name(&issue.summary, cfg.replace_spaces, &cfg.space_replacement),
        width = cfg.id_pad_width
    )
}

/// Streams each attachment into the issue folder under its server-supplied
/// name. A non-success response drops that attachment and moves on.
fn download_attachments(
    client: &YouTrackClient,
    attachments: &[Attachment],
    dir: &Path,
) -> Result<usize, ExportError> {
    let mut downloaded = 0;
    for attachment in attachments {
        let mut response = client.fetch_attachment(&attachment.url)?;
        if !response.status().is_success() {
            logging::debug(format!(
                "attachment {} returned {}, skipping",
                attachment.name,
                response.status()
            ));
            continue;
        }

        let mut file = File::create(dir.join(&attachment.name))?;
        response.copy_to(&mut file)?;
        downloaded += 1;
    }
    Ok(downloaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::Method::GET;
    use httpmock::MockServer;
    use serde_json::json;

    fn config_for(root: &Path, full_refresh: bool) -> ExportConfig {
        ExportConfig {
            project: "DR".to_string(),
            root: root.to_path_buf(),
            id_pad_width: 3,
            replace_spaces: true,
            space_replacement: "_".to_string(),
            full_refresh,
        }
    }

    fn client_for(server: &MockServer) -> YouTrackClient {
        YouTrackClient::new(server.base_url(), "secret".into()).expect("client")
    }

    fn single_issue_body() -> serde_json::Value {
        json!([
            {
                "idReadable": "DR-7",
                "numberInProject": 7,
                "summary": "Fix: bug/fix",
                "created": 1699999000000_i64,
                "description": "Exports truncate",
                "comments": [
                    {
                        "author": {"name": "Ada"},
                        "created": 1700000000000_i64,
                        "deleted": false,
                        "text": "Confirmed",
                        "reactions": []
                    }
                ],
                "attachments": [],
                "project": {"id": "0-1", "shortName": "DR"}
            }
        ])
    }

    #[test]
    fn exports_issue_into_derived_folder() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/youtrack/api/issues");
            then.status(200).json_body(single_issue_body());
        });

        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path().join("exports");
        let cfg = config_for(&root, false);

        let report = export_project(&client_for(&server), &cfg).expect("export should succeed");

        assert_eq!(report.issues_processed, 1);
        assert_eq!(report.issues_skipped, 0);

        let folder = root.join("DR-007-Fix_bugfix");
        assert!(folder.is_dir());
        let content = fs::read_to_string(folder.join("content.txt")).expect("content file");
        assert!(content.starts_with("# DR-7 - Fix: bug/fix\n\nExports truncate\n\n"));
        assert!(content.contains("Comment by Ada at 2023-11-14T22:13:20+00:00"));
    }

    #[test]
    fn second_run_skips_existing_folders_without_writing() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/youtrack/api/issues");
            then.status(200).json_body(single_issue_body());
        });

        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path().join("exports");
        let cfg = config_for(&root, false);
        let client = client_for(&server);

        export_project(&client, &cfg).expect("first export");

        // Scribble over the content file; a skipped issue must leave it be.
        let content_path = root.join("DR-007-Fix_bugfix").join("content.txt");
        fs::write(&content_path, "sentinel").expect("overwrite");

        let report = export_project(&client, &cfg).expect("second export");
        assert_eq!(report.issues_processed, 0);
        assert_eq!(report.issues_skipped, 1);
        assert_eq!(
            fs::read_to_string(&content_path).expect("content file"),
            "sentinel"
        );
    }

    #[test]
    fn full_refresh_rewrites_existing_content() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/youtrack/api/issues");
            then.status(200).json_body(single_issue_body());
        });

        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path().join("exports");
        let client = client_for(&server);

        export_project(&client, &config_for(&root, false)).expect("first export");

        let content_path = root.join("DR-007-Fix_bugfix").join("content.txt");
        fs::write(&content_path, "sentinel").expect("overwrite");

        let report =
            export_project(&client, &config_for(&root, true)).expect("refresh export");
        assert_eq!(report.issues_processed, 1);
        assert_eq!(report.issues_skipped, 0);

        let content = fs::read_to_string(&content_path).expect("content file");
        assert!(content.starts_with("# DR-7 - Fix: bug/fix"));
    }

    #[test]
    fn failed_listing_creates_nothing_and_is_not_an_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/youtrack/api/issues");
            then.status(403).body("token lacks project access");
        });

        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path().join("exports");
        let cfg = config_for(&root, false);

        let report = export_project(&client_for(&server), &cfg).expect("run ends normally");

        assert_eq!(report.issues_processed, 0);
        assert_eq!(report.issues_skipped, 0);
        assert!(!root.exists());
    }

    #[test]
    fn failed_attachment_is_skipped_but_siblings_download() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/youtrack/api/issues");
            then.status(200).json_body(json!([
                {
                    "idReadable": "DR-8",
                    "numberInProject": 8,
                    "summary": "Attachment case",
                    "created": null,
                    "description": null,
                    "comments": [],
                    "attachments": [
                        {"name": "missing.bin", "url": "/youtrack/api/files/missing.bin"},
                        {"name": "data.bin", "url": "/youtrack/api/files/data.bin"}
                    ],
                    "project": {"id": "0-1", "shortName": "DR"}
                }
            ]));
        });
        server.mock(|when, then| {
            when.method(GET).path("/youtrack/api/files/missing.bin");
            then.status(404);
        });
        server.mock(|when, then| {
            when.method(GET)
                .path("/youtrack/api/files/data.bin")
                .header("authorization", "Bearer secret");
            then.status(200).body(&[0xde, 0xad, 0xbe, 0xef][..]);
        });

        let tmp = tempfile::tempdir().expect("tempdir");
        let root = tmp.path().join("exports");
        let cfg = config_for(&root, false);

        let report = export_project(&client_for(&server), &cfg).expect("export should succeed");

        assert_eq!(report.issues_processed, 1);
        assert_eq!(report.attachments_downloaded, 1);

        let folder = root.join("DR-008-Attachment_case");
        assert!(folder.join("content.txt").is_file());
        assert!(!folder.join("missing.bin").exists());
        assert_eq!(
            fs::read(folder.join("data.bin")).expect("attachment bytes"),
            vec![0xde, 0xad, 0xbe, 0xef]
        );
    }

    #[test]
    fn folder_name_pads_and_sanitizes() {
        let issue: Issue = serde_json::from_value(
            single_issue_body()
                .as_array()
                .and_then(|items| items.first().cloned())
                .expect("issue fixture"),
        )
        .expect("fixture deserializes");

        let cfg = config_for(Path::new("exports"), false);
        assert_eq!(issue_folder_name(&issue, &cfg), "DR-007-Fix_bugfix");

        let wide = ExportConfig {
            id_pad_width: 5,
            ..cfg
        };
        assert_eq!(issue_folder_name(&issue, &wide), "DR-00007-Fix_bugfix");
    }
}

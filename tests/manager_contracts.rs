//! Contract tests for resource managers
//!
//! Each test checks that a manager or object method issues the expected verb,
//! path, query and payload, and how it reports failures.

use gitlab_objects::prelude::*;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn setup() -> (MockServer, Gitlab) {
    let server = MockServer::start().await;
    let gl = Gitlab::builder(&server.uri())
        .private_token("test-token")
        .build()
        .expect("client should build");
    (server, gl)
}

fn attrs(value: Value) -> Attrs {
    value.as_object().cloned().expect("object literal")
}

/// Query keys of every request the server has seen
async fn received_query_keys(server: &MockServer) -> Vec<Vec<String>> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| r.url.query_pairs().map(|(k, _)| k.into_owned()).collect())
        .collect()
}

mod file_tests {
    use super::*;

    const FILES: &str = "/api/v4/projects/group%2Fapp/repository/files";

    #[tokio::test]
    async fn test_get_encodes_path_and_sends_ref() {
        let (server, gl) = setup().await;

        Mock::given(method("GET"))
            .and(path(format!("{FILES}/src%2Fmain.rs")))
            .and(query_param("ref", "main"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "file_path": "src/main.rs",
                "file_name": "main.rs",
                "content": "Zm4gbWFpbigpIHt9",
                "encoding": "base64",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let file = gl.project("group/app").files().get("src/main.rs", "main").await.unwrap();
        assert_eq!(file.file_name(), Some("main.rs"));
        assert_eq!(file.decode().unwrap(), b"fn main() {}");
    }

    #[tokio::test]
    async fn test_head_returns_headers() {
        let (server, gl) = setup().await;

        Mock::given(method("HEAD"))
            .and(path(format!("{FILES}/README.md")))
            .and(query_param("ref", "main"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("X-Gitlab-Blob-Id", "79f7bbd2")
                    .insert_header("X-Gitlab-Size", "1476"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let headers = gl.project("group/app").files().head("README.md", "main").await.unwrap();
        assert_eq!(headers["x-gitlab-blob-id"], "79f7bbd2");
        assert_eq!(headers["x-gitlab-size"], "1476");
    }

    #[tokio::test]
    async fn test_head_failure_is_tagged_head() {
        let (server, gl) = setup().await;

        Mock::given(method("HEAD"))
            .and(path(format!("{FILES}/missing.txt")))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = gl
            .project("group/app")
            .files()
            .head("missing.txt", "main")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Head));
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_create_moves_file_path_into_url() {
        let (server, gl) = setup().await;

        Mock::given(method("POST"))
            .and(path(format!("{FILES}/docs%2Fnew.md")))
            .and(body_json(json!({
                "branch": "main",
                "content": "hello",
                "commit_message": "add docs",
            })))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(json!({"file_path": "docs/new.md", "branch": "main"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let file = gl
            .project("group/app")
            .files()
            .create(attrs(json!({
                "file_path": "docs/new.md",
                "branch": "main",
                "content": "hello",
                "commit_message": "add docs",
            })))
            .await
            .unwrap();
        assert_eq!(file.file_path(), Some("docs/new.md"));
    }

    #[tokio::test]
    async fn test_create_validates_before_sending() {
        let (server, gl) = setup().await;

        let err = gl
            .project("group/app")
            .files()
            .create(attrs(json!({"file_path": "a.txt", "content": "x"})))
            .await
            .unwrap_err();

        match err {
            GitlabError::MissingAttributes(keys) => {
                assert_eq!(keys, vec!["branch".to_string(), "commit_message".to_string()])
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn test_update_puts_file_path_in_body() {
        let (server, gl) = setup().await;

        Mock::given(method("PUT"))
            .and(path(format!("{FILES}/a.txt")))
            .and(body_json(json!({
                "file_path": "a.txt",
                "branch": "main",
                "content": "new",
                "commit_message": "edit",
                "last_commit_id": "abc123",
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"file_path": "a.txt", "branch": "main"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let result = gl
            .project("group/app")
            .files()
            .update(
                "a.txt",
                attrs(json!({
                    "branch": "main",
                    "content": "new",
                    "commit_message": "edit",
                    "last_commit_id": "abc123",
                })),
            )
            .await
            .unwrap();
        assert_eq!(result["branch"], "main");
    }

    #[tokio::test]
    async fn test_save_sends_required_and_changed_attrs() {
        let (server, gl) = setup().await;

        Mock::given(method("GET"))
            .and(path(format!("{FILES}/a.txt")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "file_path": "a.txt",
                "content": "b2xk",
                "encoding": "base64",
                "blob_id": "ff00",
            })))
            .mount(&server)
            .await;

        Mock::given(method("PUT"))
            .and(path(format!("{FILES}/a.txt")))
            .and(body_json(json!({
                "file_path": "a.txt",
                "branch": "feature",
                "content": "bmV3",
                "commit_message": "update a.txt",
                "encoding": "base64",
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"file_path": "a.txt", "branch": "feature"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let files = gl.project("group/app").files();
        let mut file = files.get("a.txt", "main").await.unwrap();
        file.set_content(b"new");
        file.save("feature", "update a.txt").await.unwrap();

        assert!(!file.rest().is_dirty());
        assert_eq!(file.rest().get_str("branch"), Some("feature"));
    }

    #[tokio::test]
    async fn test_delete_sends_commit_as_query() {
        let (server, gl) = setup().await;

        Mock::given(method("DELETE"))
            .and(path(format!("{FILES}/old%2Ffile.txt")))
            .and(query_param("branch", "main"))
            .and(query_param("commit_message", "remove file"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        tokio_test::assert_ok!(
            gl.project("group/app")
                .files()
                .delete("old/file.txt", "main", "remove file")
                .await
        );
    }

    #[tokio::test]
    async fn test_raw_without_ref_sends_no_query() {
        let (server, gl) = setup().await;

        Mock::given(method("GET"))
            .and(path(format!("{FILES}/bin%2Ftool.sh/raw")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"#!/bin/sh\n".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let bytes = gl.project("group/app").files().raw("bin/tool.sh", None).await.unwrap();
        assert_eq!(bytes, b"#!/bin/sh\n");
        assert_eq!(received_query_keys(&server).await, vec![Vec::<String>::new()]);
    }

    #[tokio::test]
    async fn test_raw_streams_to_writer() {
        let (server, gl) = setup().await;
        let payload = vec![7u8; 64 * 1024];

        Mock::given(method("GET"))
            .and(path(format!("{FILES}/big.bin/raw")))
            .and(query_param("ref", "v1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(payload.clone()))
            .mount(&server)
            .await;

        let mut out: Vec<u8> = Vec::new();
        let written = gl
            .project("group/app")
            .files()
            .raw_to_writer("big.bin", Some("v1.0"), &mut out)
            .await
            .unwrap();
        assert_eq!(written, payload.len() as u64);
        assert_eq!(out, payload);
    }

    #[tokio::test]
    async fn test_blame_lists_records() {
        let (server, gl) = setup().await;

        Mock::given(method("GET"))
            .and(path(format!("{FILES}/a.txt/blame")))
            .and(query_param("ref", "main"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"commit": {"id": "d42409d5"}, "lines": ["line 1", "line 2"]}
            ])))
            .mount(&server)
            .await;

        let blame = gl.project("group/app").files().blame("a.txt", "main").await.unwrap();
        assert_eq!(blame.len(), 1);
        assert_eq!(blame[0]["lines"][1], "line 2");
    }
}

mod job_tests {
    use super::*;

    const JOBS: &str = "/api/v4/projects/7/jobs";

    #[tokio::test]
    async fn test_list_sends_scope_array() {
        let (server, gl) = setup().await;

        Mock::given(method("GET"))
            .and(path(JOBS))
            .and(query_param("scope[]", "failed"))
            .and(query_param("scope[]", "canceled"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "status": "failed"},
                {"id": 2, "status": "canceled"},
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let page = gl
            .project(7u64)
            .jobs()
            .list(&ListOptions::new().filter("scope", vec!["failed", "canceled"]))
            .await
            .unwrap();
        let statuses: Vec<_> = page.items.iter().filter_map(|j| j.status()).collect();
        assert_eq!(statuses, vec!["failed", "canceled"]);
    }

    #[tokio::test]
    async fn test_cancel_and_retry_return_attrs() {
        let (server, gl) = setup().await;

        Mock::given(method("POST"))
            .and(path(format!("{JOBS}/9/cancel")))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 9, "status": "canceled"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(format!("{JOBS}/9/retry")))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 10, "status": "pending"})))
            .expect(1)
            .mount(&server)
            .await;

        let job = gl.project(7u64).jobs().lazy(9u64);
        assert_eq!(job.cancel().await.unwrap()["status"], "canceled");
        assert_eq!(job.retry().await.unwrap()["id"], 10);
        // Action results do not touch the object
        assert_eq!(job.status(), None);
    }

    #[tokio::test]
    async fn test_action_failures_use_job_kinds() {
        let (server, gl) = setup().await;

        for action in ["cancel", "retry", "play", "erase"] {
            Mock::given(method("POST"))
                .and(path(format!("{JOBS}/9/{action}")))
                .respond_with(
                    ResponseTemplate::new(403).set_body_json(json!({"message": "403 Forbidden"})),
                )
                .mount(&server)
                .await;
        }

        let mut job = gl.project(7u64).jobs().lazy(9u64);
        assert_eq!(job.cancel().await.unwrap_err().kind(), Some(ErrorKind::JobCancel));
        assert_eq!(job.retry().await.unwrap_err().kind(), Some(ErrorKind::JobRetry));
        assert_eq!(job.play().await.unwrap_err().kind(), Some(ErrorKind::JobPlay));
        assert_eq!(job.erase().await.unwrap_err().kind(), Some(ErrorKind::JobErase));
    }

    #[tokio::test]
    async fn test_play_merges_response() {
        let (server, gl) = setup().await;

        Mock::given(method("POST"))
            .and(path(format!("{JOBS}/9/play")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 9, "status": "pending"})))
            .expect(1)
            .mount(&server)
            .await;

        let mut job = gl.project(7u64).jobs().lazy(9u64);
        job.play().await.unwrap();
        assert_eq!(job.status(), Some("pending"));
    }

    #[tokio::test]
    async fn test_artifact_management() {
        let (server, gl) = setup().await;

        Mock::given(method("POST"))
            .and(path(format!("{JOBS}/9/artifacts/keep")))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path(format!("{JOBS}/9/artifacts")))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("DELETE"))
            .and(path(format!("{JOBS}/10/artifacts")))
            .respond_with(
                ResponseTemplate::new(403).set_body_json(json!({"message": "403 Forbidden"})),
            )
            .mount(&server)
            .await;

        let job = gl.project(7u64).jobs().lazy(9u64);
        let err = job.keep_artifacts().await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Create));
        tokio_test::assert_ok!(job.delete_artifacts().await);

        let locked = gl.project(7u64).jobs().lazy(10u64);
        let err = locked.delete_artifacts().await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Create));
        assert_eq!(err.status(), Some(403));
    }

    #[tokio::test]
    async fn test_plain_text_action_reply_is_success() {
        let (server, gl) = setup().await;

        Mock::given(method("POST"))
            .and(path(format!("{JOBS}/9/erase")))
            .respond_with(ResponseTemplate::new(201).set_body_string("Created"))
            .expect(1)
            .mount(&server)
            .await;

        let job = gl.project(7u64).jobs().lazy(9u64);
        tokio_test::assert_ok!(job.erase().await);
    }

    #[tokio::test]
    async fn test_artifact_path_is_not_encoded() {
        let (server, gl) = setup().await;

        Mock::given(method("GET"))
            .and(path(format!("{JOBS}/9/artifacts/dist/app.tar.gz")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"archive".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let job = gl.project(7u64).jobs().lazy(9u64);
        assert_eq!(job.artifact("dist/app.tar.gz").await.unwrap(), b"archive");
    }

    #[tokio::test]
    async fn test_trace_and_artifacts_downloads() {
        let (server, gl) = setup().await;

        Mock::given(method("GET"))
            .and(path(format!("{JOBS}/9/trace")))
            .respond_with(ResponseTemplate::new(200).set_body_string("Running with gitlab-runner\n"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{JOBS}/9/artifacts")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PK\x03\x04".to_vec()))
            .mount(&server)
            .await;

        let job = gl.project(7u64).jobs().lazy(9u64);

        let mut log = Vec::new();
        job.trace_to_writer(&mut log).await.unwrap();
        assert_eq!(String::from_utf8(log).unwrap(), "Running with gitlab-runner\n");
        assert_eq!(job.artifacts().await.unwrap(), b"PK\x03\x04");
    }

    #[tokio::test]
    async fn test_refresh_merges_current_state() {
        let (server, gl) = setup().await;

        Mock::given(method("GET"))
            .and(path(format!("{JOBS}/9")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 9, "status": "success"})))
            .mount(&server)
            .await;

        let mut job = gl.project(7u64).jobs().lazy(9u64);
        job.refresh().await.unwrap();
        assert_eq!(job.status(), Some("success"));
    }
}

mod milestone_tests {
    use super::*;

    const MILESTONES: &str = "/api/v4/projects/7/milestones";

    #[tokio::test]
    async fn test_create_posts_body() {
        let (server, gl) = setup().await;

        Mock::given(method("POST"))
            .and(path(MILESTONES))
            .and(body_json(json!({"title": "v2.0", "due_date": "2024-12-31"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 30, "iid": 4, "title": "v2.0", "due_date": "2024-12-31", "state": "active"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let milestone = gl
            .project(7u64)
            .milestones()
            .create(attrs(json!({"title": "v2.0", "due_date": "2024-12-31"})))
            .await
            .unwrap();
        assert_eq!(milestone.due_date(), chrono::NaiveDate::from_ymd_opt(2024, 12, 31));
        assert_eq!(milestone.state(), Some("active"));
    }

    #[tokio::test]
    async fn test_save_sends_only_changes() {
        let (server, gl) = setup().await;

        Mock::given(method("GET"))
            .and(path(format!("{MILESTONES}/30")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 30, "title": "v2.0", "state": "active"
            })))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path(format!("{MILESTONES}/30")))
            .and(body_json(json!({"state_event": "close"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 30, "title": "v2.0", "state": "closed"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut milestone = gl.project(7u64).milestones().get(30u64).await.unwrap();
        milestone.set("state_event", "close");
        milestone.save().await.unwrap();

        assert_eq!(milestone.state(), Some("closed"));
        assert!(!milestone.rest().is_dirty());
    }

    #[tokio::test]
    async fn test_save_without_changes_is_noop() {
        let (server, gl) = setup().await;

        let mut milestone = gl.project(7u64).milestones().lazy(30u64);
        tokio_test::assert_ok!(milestone.save().await);
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn test_object_delete() {
        let (server, gl) = setup().await;

        Mock::given(method("DELETE"))
            .and(path("/api/v4/groups/acme/milestones/12"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let milestone = gl.group("acme").milestones().lazy(12u64);
        tokio_test::assert_ok!(milestone.delete().await);
    }

    #[tokio::test]
    async fn test_list_sends_iids_array() {
        let (server, gl) = setup().await;

        Mock::given(method("GET"))
            .and(path(MILESTONES))
            .and(query_param("iids[]", "1"))
            .and(query_param("iids[]", "3"))
            .and(query_param("search", "release"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1, "iid": 1}])))
            .expect(1)
            .mount(&server)
            .await;

        let opts = ListOptions::new()
            .filter("iids", vec![1, 3])
            .filter("search", "release");
        let page = gl.project(7u64).milestones().list(&opts).await.unwrap();
        assert_eq!(page.items.len(), 1);
    }

    #[tokio::test]
    async fn test_issues_and_merge_requests() {
        let (server, gl) = setup().await;

        Mock::given(method("GET"))
            .and(path("/api/v4/groups/acme/milestones/12/issues"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 100, "title": "bug"}])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v4/groups/acme/milestones/12/merge_requests"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 200}, {"id": 201}])))
            .mount(&server)
            .await;

        let milestone = gl.group("acme").milestones().lazy(12u64);
        let issues = milestone.issues(&ListOptions::new()).await.unwrap();
        let mrs = milestone.merge_requests(&ListOptions::new()).await.unwrap();

        assert_eq!(issues.items[0].get_str("title"), Some("bug"));
        assert_eq!(mrs.items.len(), 2);
    }

    #[tokio::test]
    async fn test_related_listing_takes_only_per_page_default() {
        let server = MockServer::start().await;
        let gl = Gitlab::builder(&server.uri())
            .per_page(50)
            .order_by("id")
            .pagination("keyset")
            .build()
            .unwrap();

        Mock::given(method("GET"))
            .and(path(format!("{MILESTONES}/12/issues")))
            .and(query_param("per_page", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let milestone = gl.project(7u64).milestones().lazy(12u64);
        tokio_test::assert_ok!(milestone.issues(&ListOptions::new()).await);

        let keys = received_query_keys(&server).await;
        assert_eq!(keys, vec![vec!["per_page".to_string()]]);
    }

    #[tokio::test]
    async fn test_promote_merges_and_reports_kind() {
        let (server, gl) = setup().await;

        Mock::given(method("POST"))
            .and(path(format!("{MILESTONES}/30/promote")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 30, "group_id": 5})))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(format!("{MILESTONES}/31/promote")))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({"message": "already promoted"})))
            .mount(&server)
            .await;

        let milestones = gl.project(7u64).milestones();

        let mut promoted = milestones.lazy(30u64);
        promoted.promote().await.unwrap();
        assert_eq!(promoted.rest().get_u64("group_id"), Some(5));

        let mut failing = milestones.lazy(31u64);
        let err = failing.promote().await.unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::Promote));
        assert_eq!(err.to_string(), "promote failed (400): already promoted");
    }
}

mod registry_tests {
    use super::*;

    #[tokio::test]
    async fn test_project_repositories_and_tags() {
        let (server, gl) = setup().await;

        Mock::given(method("GET"))
            .and(path("/api/v4/projects/group%2Fapp/registry/repositories"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 1, "project_id": 9, "name": "", "location": "registry.example.com/group/app"}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v4/projects/9/registry/repositories/1/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"name": "latest", "path": "group/app:latest"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let repos = gl
            .project("group/app")
            .registry_repositories()
            .list(&ListOptions::new())
            .await
            .unwrap();
        let tags = repos.items[0].tags().unwrap().list(&ListOptions::new()).await.unwrap();
        assert_eq!(tags.items[0].name(), Some("latest"));
    }

    #[tokio::test]
    async fn test_tag_get_and_delete_by_name() {
        let (server, gl) = setup().await;
        let base = "/api/v4/projects/9/registry/repositories/1/tags";

        Mock::given(method("GET"))
            .and(path(format!("{base}/v1.2.3")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "v1.2.3", "digest": "sha256:c3a2", "total_size": 2818413
            })))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path(format!("{base}/v1.2.3")))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let tags = gl.project(9u64).registry_repositories().tags(1u64);
        let tag = tags.get("v1.2.3").await.unwrap();
        assert_eq!(tag.total_size(), Some(2818413));
        tokio_test::assert_ok!(tag.delete().await);
    }

    #[tokio::test]
    async fn test_delete_in_bulk_query() {
        let (server, gl) = setup().await;

        Mock::given(method("DELETE"))
            .and(path("/api/v4/projects/9/registry/repositories/1/tags"))
            .and(query_param("name_regex_delete", ".*"))
            .and(query_param("keep_n", "5"))
            .and(query_param("older_than", "7d"))
            .respond_with(ResponseTemplate::new(202).set_body_string("Accepted"))
            .expect(1)
            .mount(&server)
            .await;

        gl.project(9u64)
            .registry_repositories()
            .tags(1u64)
            .delete_in_bulk(".*", Some(5), None, Some("7d"))
            .await
            .unwrap();

        let keys = received_query_keys(&server).await;
        assert_eq!(keys.len(), 1);
        assert!(!keys[0].contains(&"name_regex_keep".to_string()));
    }

    #[tokio::test]
    async fn test_group_repositories_delete_through_project() {
        let (server, gl) = setup().await;

        Mock::given(method("GET"))
            .and(path("/api/v4/groups/acme/registry/repositories"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": 4, "project_id": 21, "path": "acme/web"}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/v4/projects/21/registry/repositories/4"))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&server)
            .await;

        let repos = gl
            .group("acme")
            .registry_repositories()
            .list(&ListOptions::new())
            .await
            .unwrap();
        tokio_test::assert_ok!(repos.items[0].delete().await);
    }

    #[tokio::test]
    async fn test_registry_repository_by_global_id() {
        let (server, gl) = setup().await;

        Mock::given(method("GET"))
            .and(path("/api/v4/registry/repositories/2"))
            .and(query_param("tags_count", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 2, "project_id": 9, "path": "group/app", "tags_count": 3
            })))
            .mount(&server)
            .await;

        let params = attrs(json!({"tags_count": true}));
        let repo = gl.registry_repositories().get_with(2u64, &params).await.unwrap();
        assert_eq!(repo.path(), Some("group/app"));
        assert_eq!(repo.tags().unwrap().path(), "/projects/9/registry/repositories/2/tags");
    }
}

mod ldap_tests {
    use super::*;

    #[tokio::test]
    async fn test_provider_scoped_listing() {
        let (server, gl) = setup().await;

        Mock::given(method("GET"))
            .and(path("/api/v4/ldap/ldapmain/groups"))
            .and(query_param("search", "dev"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"cn": "developers"}])))
            .expect(1)
            .mount(&server)
            .await;

        let opts = ListOptions::new()
            .filter("provider", "ldapmain")
            .filter("search", "dev");
        let groups = gl.ldap_groups().list(&opts).await.unwrap();

        assert_eq!(groups.items[0].cn(), Some("developers"));
        let keys = received_query_keys(&server).await;
        assert!(!keys[0].contains(&"provider".to_string()));
    }

    #[tokio::test]
    async fn test_list_failure_is_tagged_list() {
        let (server, gl) = setup().await;

        Mock::given(method("GET"))
            .and(path("/api/v4/ldap/groups"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({"message": "403 Forbidden"})))
            .mount(&server)
            .await;

        let err = tokio_test::assert_err!(gl.ldap_groups().list(&ListOptions::new()).await);
        assert_eq!(err.kind(), Some(ErrorKind::List));
        assert_eq!(err.status(), Some(403));
    }
}

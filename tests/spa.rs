use std::{
    fs,
    path::Path,
    str,
    time::{Duration, SystemTime},
};

use http::{header, Method, Request, Response, StatusCode};
use http_body_util::BodyExt;
use hyper_spafile::{
    Body, FileServerWithStatus, Handler, IndexFileServer, SpaFileServer, SpaOptions,
};
use tempfile::TempDir;

struct Harness {
    dir: TempDir,
}

impl Harness {
    fn new(files: Vec<(&str, &str)>) -> Harness {
        let dir = tempfile::Builder::new()
            .prefix("hyper-spafile-tests")
            .tempdir()
            .unwrap();
        for (subpath, contents) in files {
            let fullpath = dir.path().join(subpath);
            fs::create_dir_all(fullpath.parent().unwrap())
                .and_then(|_| fs::write(&fullpath, contents))
                .expect("failed to write fixtures");
        }
        Harness { dir }
    }

    fn path(&self, subpath: &str) -> std::path::PathBuf {
        self.dir.path().join(subpath)
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn spa(&self) -> SpaFileServer {
        SpaFileServer::new(self.root())
    }
}

async fn request(handler: &impl Handler, req: Request<()>) -> Response<Body> {
    handler.respond(&req).await
}

async fn get(handler: &impl Handler, path: &str) -> Response<Body> {
    let req = Request::builder()
        .uri(path)
        .body(())
        .expect("unable to build request");
    request(handler, req).await
}

async fn read_body(res: Response<Body>) -> String {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    str::from_utf8(&bytes).unwrap().to_owned()
}

fn site() -> Harness {
    Harness::new(vec![
        ("site/index.html", "this is index"),
        ("site/404.html", "this is 404"),
        ("site/app.css", "body {}"),
        ("secret", "top secret"),
    ])
}

#[tokio::test]
async fn serves_existing_file() {
    let harness = site();
    let spa = SpaFileServer::new(harness.path("site"));

    let res = get(&spa, "/app.css").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[header::CONTENT_TYPE], "text/css");
    assert_eq!(read_body(res).await, "body {}");
}

#[tokio::test]
async fn serves_not_found_page_for_missing_path() {
    let harness = site();
    let spa = SpaFileServer::new(harness.path("site"));

    let res = get(&spa, "/missing").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.headers()[header::CONTENT_TYPE], "text/html");
    assert_eq!(read_body(res).await, "this is 404");

    let res = get(&spa, "/deep/client/route").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(read_body(res).await, "this is 404");
}

#[tokio::test]
async fn refuses_traversal_with_plain_not_found() {
    let harness = site();
    let spa = SpaFileServer::new(harness.path("site"));

    for path in ["/../secret", "/../../etc/passwd", "/a/..%2f..%2fsecret", "/a/../app.css"] {
        let res = get(&spa, path).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "{path}");
        assert_eq!(
            res.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        assert_eq!(read_body(res).await.trim_end(), "Not Found", "{path}");
    }
}

#[tokio::test]
async fn traversal_is_refused_even_when_cleaning_would_make_it_safe() {
    let harness = Harness::new(vec![("index.html", "this is index")]);
    let spa = harness.spa();

    let res = get(&spa, "/xxx/../index.html").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(read_body(res).await.trim_end(), "Not Found");
}

#[tokio::test]
async fn serves_the_site_scenario() {
    let harness = site();
    let spa = SpaFileServer::new(harness.path("site"));

    let res = get(&spa, "/app.css").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(read_body(res).await, "body {}");

    let res = get(&spa, "/missing").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(read_body(res).await, "this is 404");

    let res = get(&spa, "/../secret").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body = read_body(res).await;
    assert_ne!(body, "this is 404");
    assert_ne!(body, "top secret");
}

#[tokio::test]
async fn missing_not_found_page_falls_back_to_plain_404() {
    let harness = Harness::new(vec![("index.html", "this is index")]);
    let spa = harness.spa();

    let res = get(&spa, "/missing").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(read_body(res).await.trim_end(), "404 page not found");
}

#[tokio::test]
async fn serves_index_for_root_and_directories() {
    let harness = Harness::new(vec![
        ("index.html", "this is index"),
        ("docs/index.html", "this is docs"),
    ]);
    let spa = harness.spa();

    let res = get(&spa, "/").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(read_body(res).await, "this is index");

    let res = get(&spa, "/docs/").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(read_body(res).await, "this is docs");
}

#[tokio::test]
async fn redirects_if_trailing_slash_is_missing() {
    let harness = Harness::new(vec![("dir/index.html", "this is index")]);
    let spa = harness.spa();

    let res = get(&spa, "/dir?tab=1").await;
    assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(res.headers()[header::LOCATION], "./dir/?tab=1");
}

#[tokio::test]
async fn redirect_stays_on_the_same_host() {
    let harness = Harness::new(vec![("assets/index.html", "this is index")]);
    let spa = harness.spa();

    let res = get(&spa, "//assets").await;
    assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(res.headers()[header::LOCATION], "./assets/");
}

#[tokio::test]
async fn path_through_a_file_skips_fallback_and_is_not_found() {
    let harness = site();
    let spa = SpaFileServer::new(harness.path("site"));

    // The lookup fails with "not a directory", which is not a missing file.
    let res = get(&spa, "/app.css/x").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body = read_body(res).await;
    assert_ne!(body, "this is 404");
    assert_eq!(body.trim_end(), "404 page not found");
}

#[tokio::test]
async fn directory_without_index_is_not_listed() {
    let harness = Harness::new(vec![("index.html", "x"), ("dir/file.txt", "file")]);
    let spa = harness.spa();

    let res = get(&spa, "/dir/").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(read_body(res).await.trim_end(), "404 page not found");
}

#[tokio::test]
async fn decodes_percent_notation() {
    let harness = Harness::new(vec![("has space.html", "file with funky chars")]);
    let spa = harness.spa();

    let res = get(&spa, "/has%20space.html").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(read_body(res).await, "file with funky chars");
}

#[tokio::test]
async fn collapses_repeated_separators() {
    let harness = Harness::new(vec![("assets/app.css", "body {}")]);
    let spa = harness.spa();

    let res = get(&spa, "/assets//./app.css").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(read_body(res).await, "body {}");
}

#[tokio::test]
async fn index_server_ignores_request_path() {
    let harness = Harness::new(vec![("index.html", "this is index"), ("other.html", "other")]);
    let index = IndexFileServer::new(harness.root());

    for path in ["/", "/foo/bar", "/??x=1", "/other.html"] {
        let res = get(&index, path).await;
        assert_eq!(res.status(), StatusCode::OK, "{path}");
        assert_eq!(res.headers()[header::CONTENT_TYPE], "text/html");
        assert_eq!(read_body(res).await, "this is index", "{path}");
    }
}

#[tokio::test]
async fn index_server_reports_missing_index() {
    let harness = Harness::new(vec![]);
    let index = IndexFileServer::new(harness.root());

    let res = get(&index, "/").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn file_server_with_status_forces_status() {
    let harness = Harness::new(vec![("custom.html", "custom page")]);
    let server =
        FileServerWithStatus::new(harness.path("custom.html"), StatusCode::SERVICE_UNAVAILABLE);

    let res = get(&server, "/anything").await;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(read_body(res).await, "custom page");

    // Would otherwise be `304 Not Modified`.
    let if_modified = SystemTime::now() + Duration::from_secs(3600);
    let req = Request::builder()
        .uri("/")
        .header(header::IF_MODIFIED_SINCE, httpdate::fmt_http_date(if_modified))
        .body(())
        .unwrap();
    let res = request(&server, req).await;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    // Would otherwise be `206 Partial Content`.
    let req = Request::builder()
        .uri("/")
        .header(header::RANGE, "bytes=0-5")
        .body(())
        .unwrap();
    let res = request(&server, req).await;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(read_body(res).await, "custom");
}

#[tokio::test]
async fn file_server_with_status_keeps_status_for_missing_file() {
    let harness = Harness::new(vec![]);
    let server =
        FileServerWithStatus::new(harness.path("custom.html"), StatusCode::SERVICE_UNAVAILABLE);

    let res = get(&server, "/").await;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(read_body(res).await.trim_end(), "404 page not found");
}

#[tokio::test]
async fn uses_configured_file_names() {
    let harness = Harness::new(vec![
        ("main.html", "this is main"),
        ("missing.html", "this is missing"),
    ]);
    let mut options = SpaOptions::new();
    options
        .index_file_name("main.html")
        .not_found_file_name("missing.html");

    let spa = SpaFileServer::with_options(harness.root(), &options);
    let res = get(&spa, "/nope").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(read_body(res).await, "this is missing");

    let res = get(&spa, "/").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(read_body(res).await, "this is main");

    let index = IndexFileServer::with_options(harness.root(), &options);
    let res = get(&index, "/whatever").await;
    assert_eq!(read_body(res).await, "this is main");
}

#[tokio::test]
async fn delegates_to_custom_not_found_handler() {
    let harness = Harness::new(vec![("index.html", "this is index")]);
    let fallback = IndexFileServer::new(harness.root());
    let spa = SpaFileServer::with_not_found(harness.root(), &SpaOptions::default(), fallback);

    let res = get(&spa, "/client/side/route").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(read_body(res).await, "this is index");
}

#[tokio::test]
async fn sends_headers() {
    let harness = Harness::new(vec![("file1.html", "this is file1")]);
    let spa = harness.spa();

    let res = get(&spa, "/file1.html").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[header::CONTENT_LENGTH], "13");
    assert_eq!(res.headers()[header::ACCEPT_RANGES], "bytes");
    assert!(res.headers().get(header::LAST_MODIFIED).is_some());
    assert!(res.headers().get(header::ETAG).is_some());
    assert!(res.headers().get(header::CACHE_CONTROL).is_none());
    assert_eq!(res.headers()[header::CONTENT_TYPE], "text/html");
    assert_eq!(read_body(res).await, "this is file1");
}

#[tokio::test]
async fn changes_content_type_on_extension() {
    let harness = Harness::new(vec![("file1.gif", "this is file1")]);
    let spa = harness.spa();

    let res = get(&spa, "/file1.gif").await;
    assert_eq!(res.headers()[header::CONTENT_TYPE], "image/gif");
}

#[tokio::test]
async fn head_request_has_no_body() {
    let harness = Harness::new(vec![("file1.html", "this is file1")]);
    let spa = harness.spa();

    let req = Request::builder()
        .method(Method::HEAD)
        .uri("/file1.html")
        .body(())
        .unwrap();
    let res = request(&spa, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[header::CONTENT_LENGTH], "13");
    assert_eq!(read_body(res).await, "");
}

#[tokio::test]
async fn serves_file_with_old_if_modified_since() {
    let harness = Harness::new(vec![("file1.html", "this is file1")]);
    let spa = harness.spa();

    let if_modified = SystemTime::now() - Duration::from_secs(3600);
    let req = Request::builder()
        .uri("/file1.html")
        .header(header::IF_MODIFIED_SINCE, httpdate::fmt_http_date(if_modified))
        .body(())
        .unwrap();
    let res = request(&spa, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(read_body(res).await, "this is file1");
}

#[tokio::test]
async fn serves_file_with_new_if_modified_since() {
    let harness = Harness::new(vec![("file1.html", "this is file1")]);
    let spa = harness.spa();

    let if_modified = SystemTime::now() + Duration::from_secs(3600);
    let req = Request::builder()
        .uri("/file1.html")
        .header(header::IF_MODIFIED_SINCE, httpdate::fmt_http_date(if_modified))
        .body(())
        .unwrap();
    let res = request(&spa, req).await;
    assert_eq!(res.status(), StatusCode::NOT_MODIFIED);
    assert_eq!(read_body(res).await, "");
}

#[tokio::test]
async fn serves_not_modified_for_matching_etag() {
    let harness = Harness::new(vec![("file1.html", "this is file1")]);
    let spa = harness.spa();

    let res = get(&spa, "/file1.html").await;
    let etag = res.headers()[header::ETAG].clone();

    let req = Request::builder()
        .uri("/file1.html")
        .header(header::IF_NONE_MATCH, etag)
        .body(())
        .unwrap();
    let res = request(&spa, req).await;
    assert_eq!(res.status(), StatusCode::NOT_MODIFIED);

    let req = Request::builder()
        .uri("/file1.html")
        .header(header::IF_NONE_MATCH, "\"something-else\"")
        .body(())
        .unwrap();
    let res = request(&spa, req).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn serves_requested_range() {
    let harness = Harness::new(vec![("file1.html", "this is file1")]);
    let spa = harness.spa();

    let req = Request::builder()
        .uri("/file1.html")
        .header(header::RANGE, "bytes=8-")
        .body(())
        .unwrap();
    let res = request(&spa, req).await;
    assert_eq!(res.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(res.headers()[header::CONTENT_RANGE], "bytes 8-12/13");
    assert_eq!(res.headers()[header::CONTENT_LENGTH], "5");
    assert_eq!(read_body(res).await, "file1");
}

#[tokio::test]
async fn rejects_unsatisfiable_range() {
    let harness = Harness::new(vec![("file1.html", "this is file1")]);
    let spa = harness.spa();

    let req = Request::builder()
        .uri("/file1.html")
        .header(header::RANGE, "bytes=100-")
        .body(())
        .unwrap();
    let res = request(&spa, req).await;
    assert_eq!(res.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(res.headers()[header::CONTENT_RANGE], "bytes */13");
}

#[tokio::test]
async fn serves_full_file_for_multiple_ranges() {
    let harness = Harness::new(vec![("file1.html", "this is file1")]);
    let spa = harness.spa();

    let req = Request::builder()
        .uri("/file1.html")
        .header(header::RANGE, "bytes=0-1,5-6")
        .body(())
        .unwrap();
    let res = request(&spa, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(read_body(res).await, "this is file1");
}

#[tokio::test]
async fn ignores_range_when_if_range_does_not_match() {
    let harness = Harness::new(vec![("file1.html", "this is file1")]);
    let spa = harness.spa();

    let req = Request::builder()
        .uri("/file1.html")
        .header(header::RANGE, "bytes=0-3")
        .header(header::IF_RANGE, "\"stale\"")
        .body(())
        .unwrap();
    let res = request(&spa, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(read_body(res).await, "this is file1");
}

#[tokio::test]
async fn serves_range_for_any_method() {
    let harness = Harness::new(vec![("file1.html", "this is file1")]);
    let spa = harness.spa();

    let req = Request::builder()
        .method(Method::POST)
        .uri("/file1.html")
        .header(header::RANGE, "bytes=0-3")
        .body(())
        .unwrap();
    let res = request(&spa, req).await;
    assert_eq!(res.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(read_body(res).await, "this");
}

mod common;

use pretty_assertions::assert_eq;
use rdm::debrid::{ApiRequest, DebridClient, FileSelection, TorrentStatus};
use rdm::error::AppError;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use serde_json::json;
use std::error::Error as _;
use std::time::Duration;
use wiremock::matchers::{body_string, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{hosts_json, torrent_json, user_json, MAGNET};

fn client_for(server: &MockServer) -> DebridClient {
  DebridClient::new("test-token").with_base_url(server.uri())
}

#[tokio::test]
async fn test_user_sends_bearer_token() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/user"))
    .and(header("authorization", "Bearer test-token"))
    .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
    .expect(1)
    .mount(&server)
    .await;

  let user = client_for(&server).user().await.unwrap();
  assert_eq!(user.username, "alice");
  assert_eq!(user.id, 1);
}

#[tokio::test]
async fn test_unauthorized_is_auth_error() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/user"))
    .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "bad_token", "error_code": 8})))
    .mount(&server)
    .await;

  let err = client_for(&server).user().await.unwrap_err();
  assert_eq!(err.code(), "AUTH_ERROR");
  assert!(err.is_auth());
  assert_eq!(err.to_string(), "HTTP 401: Unauthorized");
}

#[tokio::test]
async fn test_status_codes_are_classified() {
  let server = MockServer::start().await;
  for (status, id) in [(404u16, "missing"), (429, "busy"), (503, "down"), (403, "locked")] {
    Mock::given(method("GET"))
      .and(path(format!("/torrents/info/{}", id)))
      .respond_with(ResponseTemplate::new(status))
      .mount(&server)
      .await;
  }
  let client = client_for(&server);

  let err = client.torrent_info("missing").await.unwrap_err();
  assert_eq!((err.code(), err.status()), ("API_ERROR", Some(404)));
  assert_eq!(err.user_message(), "Resource not found.");

  let err = client.torrent_info("busy").await.unwrap_err();
  assert_eq!(err.code(), "RATE_LIMIT_ERROR");

  let err = client.torrent_info("down").await.unwrap_err();
  assert_eq!(err.user_message(), "Server error. Please try again later.");

  let err = client.torrent_info("locked").await.unwrap_err();
  assert_eq!(err.code(), "AUTH_ERROR");
}

#[tokio::test]
async fn test_torrents_and_detail() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/torrents"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!([torrent_json("AAA"), torrent_json("BBB")])))
    .mount(&server)
    .await;

  let mut detail = torrent_json("AAA");
  detail["files"] = json!([
    { "id": 1, "path": "/ubuntu.iso", "bytes": 6_114_656_256u64, "selected": 1 },
    { "id": 2, "path": "/README.txt", "bytes": 512, "selected": 0 }
  ]);
  Mock::given(method("GET"))
    .and(path("/torrents/info/AAA"))
    .respond_with(ResponseTemplate::new(200).set_body_json(detail))
    .mount(&server)
    .await;

  let client = client_for(&server);
  let torrents = client.torrents().await.unwrap();
  assert_eq!(torrents.len(), 2);
  assert_eq!(torrents[1].id, "BBB");
  assert_eq!(torrents[0].status, TorrentStatus::Downloaded);

  let torrent = client.torrent_info("AAA").await.unwrap();
  let files = torrent.files.unwrap();
  assert_eq!(files.len(), 2);
  assert_eq!(files[0].selected, 1);
}

#[tokio::test]
async fn test_add_magnet_posts_form() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .and(path("/torrents/addMagnet"))
    .and(header("content-type", "application/x-www-form-urlencoded"))
    .and(body_string_contains("magnet=magnet%3A%3Fxt%3Durn%3Abtih%3Add8255ecdc7ca55fb0bbf81323d87062db1f6d1c"))
    .and(body_string_contains("host=real-debrid.com"))
    .respond_with(ResponseTemplate::new(201).set_body_json(json!({
      "id": "NEWID",
      "uri": "https://api.real-debrid.com/rest/1.0/torrents/info/NEWID"
    })))
    .expect(1)
    .mount(&server)
    .await;

  let added = client_for(&server)
    .add_magnet(MAGNET, "real-debrid.com")
    .await
    .unwrap();
  assert_eq!(added.id, "NEWID");
  assert!(added.uri.ends_with("/torrents/info/NEWID"));
}

#[tokio::test]
async fn test_select_files_sends_csv() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .and(path("/torrents/selectFiles/abc123"))
    .and(body_string("files=1,2,3"))
    .respond_with(ResponseTemplate::new(204))
    .expect(1)
    .mount(&server)
    .await;

  client_for(&server)
    .select_files("abc123", &FileSelection::Ids(vec![1, 2, 3]))
    .await
    .unwrap();
}

#[tokio::test]
async fn test_select_all_files() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .and(path("/torrents/selectFiles/abc123"))
    .and(header("content-type", "application/x-www-form-urlencoded"))
    .and(body_string("files=all"))
    .respond_with(ResponseTemplate::new(204))
    .expect(1)
    .mount(&server)
    .await;

  client_for(&server)
    .select_files("abc123", &FileSelection::All)
    .await
    .unwrap();
}

#[tokio::test]
async fn test_delete_torrent() {
  let server = MockServer::start().await;
  Mock::given(method("DELETE"))
    .and(path("/torrents/delete/abc123"))
    .respond_with(ResponseTemplate::new(204))
    .expect(1)
    .mount(&server)
    .await;

  client_for(&server).delete_torrent("abc123").await.unwrap();
}

#[tokio::test]
async fn test_unrestrict_link() {
  let server = MockServer::start().await;
  Mock::given(method("POST"))
    .and(path("/unrestrict/link"))
    .and(body_string("link=https%3A%2F%2Freal-debrid.com%2Fd%2FABCDEF"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "id": "XYZ",
      "filename": "ubuntu.iso",
      "mimeType": "application/x-iso9660-image",
      "filesize": 6_114_656_256u64,
      "link": "https://real-debrid.com/d/ABCDEF",
      "host": "real-debrid.com",
      "chunks": 32,
      "crc": 1,
      "download": "https://download.real-debrid.com/d/XYZ/ubuntu.iso",
      "streamable": 0
    })))
    .mount(&server)
    .await;

  let link = client_for(&server)
    .unrestrict_link("https://real-debrid.com/d/ABCDEF")
    .await
    .unwrap();
  assert_eq!(link.mime_type, "application/x-iso9660-image");
  assert_eq!(link.host_icon, None);
  assert!(link.download.ends_with("ubuntu.iso"));
}

#[tokio::test]
async fn test_available_hosts() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/torrents/availableHosts"))
    .respond_with(ResponseTemplate::new(200).set_body_json(hosts_json()))
    .mount(&server)
    .await;

  let hosts = client_for(&server).available_hosts().await.unwrap();
  assert_eq!(hosts.len(), 2);
  assert_eq!(hosts[0].host, "real-debrid.com");
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/user"))
    .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
    .mount(&server)
    .await;

  let err = client_for(&server).user().await.unwrap_err();
  assert_eq!(err.code(), "DECODE_ERROR");
  assert!(err.source().is_some());
}

#[tokio::test]
async fn test_caller_headers_override_authorization() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/user"))
    .and(header("authorization", "Bearer other-token"))
    .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
    .expect(1)
    .mount(&server)
    .await;

  let request = ApiRequest::get("/user").header(AUTHORIZATION, HeaderValue::from_static("Bearer other-token"));
  let user: rdm::debrid::User = client_for(&server).execute(request).await.unwrap();
  assert_eq!(user.username, "alice");
}

#[tokio::test]
async fn test_connection_refused_is_network_error_with_cause() {
  let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
  let addr = listener.local_addr().unwrap();
  drop(listener);

  let client = DebridClient::new("test-token").with_base_url(format!("http://{}", addr));
  let err = client.add_magnet(MAGNET, "real-debrid.com").await.unwrap_err();

  assert!(matches!(err, AppError::Network { .. }));
  assert_eq!(err.code(), "NETWORK_ERROR");
  let cause = err.source().expect("network error keeps its cause");
  let cause = cause.downcast_ref::<reqwest::Error>().expect("cause is the transport error");
  assert!(cause.is_connect());
}

#[tokio::test]
async fn test_timeout_is_network_error() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/torrents"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!([])).set_delay(Duration::from_secs(2)))
    .mount(&server)
    .await;

  let err = client_for(&server)
    .with_timeout(Duration::from_millis(100))
    .torrents()
    .await
    .unwrap_err();
  assert_eq!(err.code(), "NETWORK_ERROR");
}

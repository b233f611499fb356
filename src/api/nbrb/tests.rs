use super::*;
use chrono::NaiveDate;
use mockito::Matcher;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn sample_body() -> String {
    serde_json::json!([
        {"Cur_ID": 145, "Date": "2020-01-01T00:00:00", "Cur_OfficialRate": 2.1036},
        {"Cur_ID": 145, "Date": "2020-01-02T00:00:00", "Cur_OfficialRate": 2.1084},
        {"Cur_ID": 145, "Date": "2020-01-03T00:00:00", "Cur_OfficialRate": 2.1112}
    ])
    .to_string()
}

fn query_for(start: &str, end: &str) -> Matcher {
    Matcher::AllOf(vec![
        Matcher::UrlEncoded("startDate".into(), start.into()),
        Matcher::UrlEncoded("endDate".into(), end.into()),
    ])
}

fn test_client(url: String) -> NbrbClient {
    NbrbClient::with_policy(url, RetryPolicy::immediate(5))
}

// === fetch_rates: success ===

#[tokio::test]
async fn test_fetch_rates_success() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/145")
        .match_query(query_for("2020-01-01", "2020-01-03"))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(sample_body())
        .expect(1)
        .create_async()
        .await;

    let client = test_client(server.url());
    let records = client
        .fetch_rates("usd", day(2020, 1, 1), day(2020, 1, 3))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(records.len(), 3);
    assert_eq!(records[0], RateRecord::new(day(2020, 1, 1), 2.1036));
    assert_eq!(records[2], RateRecord::new(day(2020, 1, 3), 2.1112));
}

#[tokio::test]
async fn test_fetch_rates_uses_currency_id_in_path() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/19")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("[]")
        .expect(1)
        .create_async()
        .await;

    let client = test_client(server.url());
    let records = client
        .fetch_rates("EUR", day(2021, 5, 1), day(2021, 5, 2))
        .await
        .unwrap();

    mock.assert_async().await;
    assert!(records.is_empty());
}

// === fetch_rates: errors ===

#[tokio::test]
async fn test_unknown_currency_makes_no_request() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", Matcher::Any)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("[]")
        .expect(0)
        .create_async()
        .await;

    let client = test_client(server.url());
    let err = client
        .fetch_rates("GBP", day(2020, 1, 1), day(2020, 1, 3))
        .await
        .unwrap_err();

    assert!(matches!(err, RateError::Configuration(_)));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_retries_until_success_within_budget() {
    let mut server = mockito::Server::new_async().await;
    let unavailable = server
        .mock("GET", "/145")
        .match_query(Matcher::Any)
        .with_status(503)
        .expect(4)
        .create_async()
        .await;
    let ok = server
        .mock("GET", "/145")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(sample_body())
        .expect(1)
        .create_async()
        .await;

    let client = test_client(server.url());
    let records = client
        .fetch_rates("USD", day(2020, 1, 1), day(2020, 1, 3))
        .await
        .unwrap();

    unavailable.assert_async().await;
    ok.assert_async().await;
    assert_eq!(records.len(), 3);
}

#[tokio::test]
async fn test_always_500_exhausts_retries() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/145")
        .match_query(Matcher::Any)
        .with_status(500)
        .expect(6)
        .create_async()
        .await;

    let client = test_client(server.url());
    let err = client
        .fetch_rates("USD", day(2020, 1, 1), day(2020, 1, 3))
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert!(matches!(err, RateError::Network(_)));
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn test_non_retryable_status_is_remote_error() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/190")
        .match_query(Matcher::Any)
        .with_status(404)
        .expect(1)
        .create_async()
        .await;

    let client = test_client(server.url());
    let err = client
        .fetch_rates("RUB", day(2020, 1, 1), day(2020, 1, 3))
        .await
        .unwrap_err();

    mock.assert_async().await;
    assert_eq!(err, RateError::Remote { status: 404 });
    assert_eq!(err.to_string(), "NBRB API returned 404 http status code");
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    // Nothing listens on the discard port.
    let client = test_client("http://127.0.0.1:9".to_string());
    let err = client
        .fetch_rates("USD", day(2020, 1, 1), day(2020, 1, 3))
        .await
        .unwrap_err();

    assert!(matches!(err, RateError::Network(_)));
}

#[tokio::test]
async fn test_missing_field_is_data_format_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/145")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"[{"Date": "2020-01-01T00:00:00"}]"#)
        .create_async()
        .await;

    let client = test_client(server.url());
    let err = client
        .fetch_rates("USD", day(2020, 1, 1), day(2020, 1, 1))
        .await
        .unwrap_err();

    assert!(err.is_data_format());
    assert!(err.to_string().contains("Cur_OfficialRate"));
}

// === parse_rates ===

#[test]
fn test_parse_rates_rejects_bad_date() {
    let err = parse_rates(r#"[{"Date": "01.01.2020", "Cur_OfficialRate": 1.0}]"#).unwrap_err();
    assert!(err.is_data_format());
}

#[test]
fn test_parse_rates_rejects_non_json() {
    let err = parse_rates("<html>maintenance</html>").unwrap_err();
    assert!(err.is_data_format());
}

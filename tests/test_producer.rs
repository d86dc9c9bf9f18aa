use std::path::PathBuf;

use libhttp::http::producer::{BodyProducer, BufferProducer, FileProducer};

fn temp_file(name: &str, contents: &[u8]) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("libhttp-producer-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

async fn drain(producer: &mut dyn BodyProducer) -> Vec<u8> {
    let mut out = Vec::new();
    while let Some(chunk) = producer.read_chunk().await.unwrap() {
        if chunk.is_empty() {
            break;
        }
        out.extend_from_slice(&chunk);
    }
    out
}

#[tokio::test]
async fn test_buffer_producer_single_chunk() {
    let mut producer = BufferProducer::new("abc");
    assert!(!producer.is_connected());

    producer.connect(None).await.unwrap();
    assert!(producer.is_connected());
    assert_eq!(drain(&mut producer).await, b"abc");
    assert!(producer.read_chunk().await.unwrap().is_none());

    producer.disconnect().await;
    assert!(!producer.is_connected());
}

#[tokio::test]
async fn test_buffer_producer_empty() {
    let mut producer = BufferProducer::empty();

    assert!(producer.is_empty());
    assert!(producer.read_chunk().await.unwrap().is_none());
    let headers = producer.additional_headers().unwrap();
    assert_eq!(headers.get("Content-Length").unwrap(), "0");
}

#[tokio::test]
async fn test_file_producer_streams_in_chunks() {
    let contents: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
    let path = temp_file("data.bin", &contents);

    let mut producer = FileProducer::open(&path).await.unwrap().with_chunk_size(1000);
    let headers = producer.additional_headers().unwrap();
    assert_eq!(headers.get("Content-Length").unwrap(), "10000");
    assert_eq!(headers.get("Content-Type").unwrap(), "application/octet-stream");

    producer.connect(None).await.unwrap();
    assert!(producer.is_connected());

    let mut total = Vec::new();
    while let Some(chunk) = producer.read_chunk().await.unwrap() {
        assert!(chunk.len() <= 1000);
        total.extend_from_slice(&chunk);
    }
    assert_eq!(total, contents);

    producer.disconnect().await;
    assert!(!producer.is_connected());
}

#[tokio::test]
async fn test_file_producer_content_type() {
    let path = temp_file("page.html", b"<p>hi</p>");

    let mut producer = FileProducer::open(&path).await.unwrap();
    let headers = producer.additional_headers().unwrap();
    assert_eq!(headers.get("Content-Type").unwrap(), "text/html; charset=utf-8");

    producer.connect(None).await.unwrap();
    assert_eq!(drain(&mut producer).await, b"<p>hi</p>");
}

#[tokio::test]
async fn test_file_producer_missing_file() {
    let missing = std::env::temp_dir().join("libhttp-no-such-file.txt");

    assert!(FileProducer::open(&missing).await.is_err());

    let mut producer = FileProducer::new(&missing, 0);
    assert!(producer.connect(None).await.is_err());
    assert!(producer.read_chunk().await.is_err());
}

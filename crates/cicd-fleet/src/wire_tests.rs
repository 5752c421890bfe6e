use super::*;
use cicd_core::{DownstreamMessage, JobCancelMessage, JobId};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

#[tokio::test]
async fn a_frame_round_trips_through_duplex_streams() {
    let (mut client, mut server) = tokio::io::duplex(4096);
    let msg = DownstreamMessage::JobCancel(JobCancelMessage { job_id: JobId::new("job-1") });

    write_frame(&mut client, &msg, Duration::from_secs(1)).await.unwrap();
    let received: DownstreamMessage = read_frame(&mut server, Duration::from_secs(1)).await.unwrap();

    match received {
        DownstreamMessage::JobCancel(m) => assert_eq!(m.job_id, JobId::new("job-1")),
        _ => panic!("expected job_cancel"),
    }
}

#[tokio::test]
async fn read_past_max_size_is_rejected() {
    let (mut client, mut server) = tokio::io::duplex(8);
    let oversized = (MAX_MESSAGE_SIZE as u32 + 1).to_be_bytes();
    client.write_all(&oversized).await.unwrap();

    let err = read_message(&mut server).await.unwrap_err();
    assert!(matches!(err, ProtocolError::MessageTooLarge { .. }));
}

#[tokio::test]
async fn read_times_out_when_no_frame_arrives() {
    let (_client, mut server) = tokio::io::duplex(8);
    let err = read_frame::<DownstreamMessage, _>(&mut server, Duration::from_millis(10))
        .await
        .unwrap_err();
    assert!(matches!(err, ProtocolError::Timeout));
}

#[tokio::test]
async fn closed_stream_reports_connection_closed() {
    let (client, mut server) = tokio::io::duplex(8);
    drop(client);
    let err = read_message(&mut server).await.unwrap_err();
    assert!(matches!(err, ProtocolError::ConnectionClosed));
}

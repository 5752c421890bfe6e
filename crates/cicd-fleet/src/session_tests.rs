use super::*;
use async_trait::async_trait;
use cicd_core::{FakeClock, JobCancelMessage, JobId, JobResultMessage, JobStatus, SessionId};
use parking_lot::Mutex as PLMutex;
use std::sync::Arc;

#[derive(Default)]
struct RecordingSink {
    results: PLMutex<Vec<JobId>>,
}

#[async_trait]
impl JobResultSink for RecordingSink {
    async fn handle_job_result(&self, job_id: &JobId, _outcome: JobOutcome) -> Result<(), CoreError> {
        self.results.lock().push(job_id.clone());
        Ok(())
    }
}

fn handle() -> Arc<SessionHandle> {
    let (tx, _rx) = mpsc::channel(4);
    let info = RunnerSessionInfo::new(SessionId::generate(), RunnerId::new("r1"), chrono::Utc::now());
    Arc::new(SessionHandle::new(info, tx))
}

#[tokio::test]
async fn reader_loop_forwards_job_result_to_the_sink() {
    let (mut client, mut server) = tokio::io::duplex(4096);
    let recording = Arc::new(RecordingSink::default());
    let sink: Arc<dyn JobResultSink> = recording.clone();
    let handle = handle();
    let runner_id = RunnerId::new("r1");
    let clock = FakeClock::new();
    let cancel = CancelToken::never();

    let msg = UpstreamMessage::JobResult(JobResultMessage {
        job_id: JobId::new("job-1"),
        status: JobStatus::Success,
        exit_code: Some(0),
        output: String::new(),
        started_at: None,
        finished_at: None,
        artifacts: vec![],
    });
    write_frame(&mut client, &msg, std::time::Duration::from_secs(1)).await.unwrap();
    drop(client);

    let result = run_reader_loop(
        &mut server, &handle, &sink, &runner_id, std::time::Duration::from_secs(1), &clock, &cancel,
    )
    .await;
    assert!(result.is_err());
    assert_eq!(*recording.results.lock(), vec![JobId::new("job-1")]);
}

#[tokio::test]
async fn reader_loop_updates_last_ping_at_on_heartbeat() {
    let (mut client, mut server) = tokio::io::duplex(4096);
    let sink: Arc<dyn JobResultSink> = Arc::new(RecordingSink::default());
    let handle = handle();
    let runner_id = RunnerId::new("r1");
    let clock = FakeClock::new();
    let cancel = CancelToken::never();
    let before = handle.info.lock().last_ping_at;

    clock.advance(std::time::Duration::from_secs(5));
    write_frame(&mut client, &UpstreamMessage::Heartbeat, std::time::Duration::from_secs(1)).await.unwrap();
    drop(client);

    let _ = run_reader_loop(
        &mut server, &handle, &sink, &runner_id, std::time::Duration::from_secs(1), &clock, &cancel,
    )
    .await;
    assert!(handle.info.lock().last_ping_at > before);
}

#[tokio::test]
async fn writer_loop_drains_queued_messages_then_closes() {
    let (mut writer, mut reader) = tokio::io::duplex(4096);
    let (tx, rx) = mpsc::channel(4);
    let cancel = CancelToken::never();

    tx.try_send(DownstreamMessage::JobCancel(JobCancelMessage { job_id: JobId::new("job-1") })).unwrap();
    drop(tx);

    let result = run_writer_loop(
        &mut writer, rx, std::time::Duration::from_secs(1), std::time::Duration::from_secs(60), &cancel,
    )
    .await;
    assert!(result.is_ok());

    let received: DownstreamMessage = read_frame(&mut reader, std::time::Duration::from_secs(1)).await.unwrap();
    match received {
        DownstreamMessage::JobCancel(m) => assert_eq!(m.job_id, JobId::new("job-1")),
        _ => panic!("expected job_cancel"),
    }
}

#[tokio::test]
async fn writer_loop_emits_a_ping_on_the_configured_interval() {
    let (mut writer, mut reader) = tokio::io::duplex(4096);
    let (_tx, rx) = mpsc::channel(4);
    let cancel = CancelToken::never();

    let writer_task = tokio::spawn(async move {
        let _ = run_writer_loop(
            &mut writer, rx, std::time::Duration::from_secs(1), std::time::Duration::from_millis(10), &cancel,
        )
        .await;
    });

    let received: DownstreamMessage = read_frame(&mut reader, std::time::Duration::from_secs(1)).await.unwrap();
    assert!(matches!(received, DownstreamMessage::Ping));
    writer_task.abort();
}

use tokio::sync::mpsc;

use crate::db::types::SubmissionStatus;

/// Progress notifications emitted after a student-visible milestone is
/// durably recorded. Listeners react to these; producers never wait on
/// them, and a missing listener only costs the side effects.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ProgressEvent {
    SubmissionJudged {
        submission_id: String,
        student_id: String,
        problem_id: String,
        status: SubmissionStatus,
    },
    LessonCompleted {
        student_id: String,
        lesson_id: String,
        points: i32,
    },
    QuizCompleted {
        student_id: String,
        quiz_id: String,
        score: f64,
    },
}

/// Unbounded in-process channel. One receiver per process; emitters are
/// cheap clones handed out through `AppState`.
#[derive(Clone)]
pub(crate) struct EventBus {
    sender: mpsc::UnboundedSender<ProgressEvent>,
}

pub(crate) struct EventStream {
    receiver: mpsc::UnboundedReceiver<ProgressEvent>,
}

impl EventBus {
    pub(crate) fn new() -> (Self, EventStream) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, EventStream { receiver })
    }

    /// Best-effort emit. A closed channel (listener gone during
    /// shutdown) is logged and swallowed; the producing operation has
    /// already committed and must not fail here.
    pub(crate) fn emit(&self, event: ProgressEvent) {
        if self.sender.send(event).is_err() {
            tracing::warn!("progress event dropped: no listener attached");
            metrics::counter!("events_dropped_total").increment(1);
        }
    }
}

impl EventStream {
    pub(crate) async fn next(&mut self) -> Option<ProgressEvent> {
        self.receiver.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn emitted_events_arrive_in_order() {
        let (bus, mut stream) = EventBus::new();

        bus.emit(ProgressEvent::LessonCompleted {
            student_id: "s1".into(),
            lesson_id: "l1".into(),
            points: 10,
        });
        bus.emit(ProgressEvent::QuizCompleted {
            student_id: "s1".into(),
            quiz_id: "q1".into(),
            score: 80.0,
        });

        assert!(matches!(stream.next().await, Some(ProgressEvent::LessonCompleted { .. })));
        assert!(matches!(stream.next().await, Some(ProgressEvent::QuizCompleted { .. })));
    }

    #[tokio::test]
    async fn emit_without_listener_does_not_panic() {
        let (bus, stream) = EventBus::new();
        drop(stream);

        bus.emit(ProgressEvent::LessonCompleted {
            student_id: "s1".into(),
            lesson_id: "l1".into(),
            points: 10,
        });
    }
}

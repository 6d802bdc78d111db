//! Work that must run on the render thread, queued from any thread.

use crossbeam_channel::{unbounded, Receiver, Sender};
use viewstate::Hue;

use crate::capture::CaptureRequest;

/// A deferred GPU-side action, executed at the start of the next frame.
#[derive(Debug)]
pub enum GpuTask {
    /// Make the given palette texture the active one.
    BindPalette(Hue),
    /// Read the next rendered frame back and encode it as PNG.
    Capture(CaptureRequest),
}

impl GpuTask {
    pub fn label(&self) -> &'static str {
        match self {
            GpuTask::BindPalette(_) => "bind-palette",
            GpuTask::Capture(_) => "capture",
        }
    }
}

/// Multi-producer FIFO drained by the render thread.
#[derive(Debug, Clone)]
pub struct TaskQueue {
    sender: Sender<GpuTask>,
    receiver: Receiver<GpuTask>,
}

impl TaskQueue {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    pub fn enqueue(&self, task: GpuTask) {
        tracing::trace!(task = task.label(), "queued GPU task");
        // Both ends live in `self`, so the channel cannot be disconnected here.
        let _ = self.sender.send(task);
    }

    /// Runs every task queued before this call, in submission order.
    ///
    /// Tasks enqueued while draining (including by `run` itself) wait for the
    /// next drain. Returns how many tasks ran.
    pub fn drain(&self, mut run: impl FnMut(GpuTask)) -> usize {
        let queued = self.receiver.len();
        let mut executed = 0;
        for _ in 0..queued {
            match self.receiver.try_recv() {
                Ok(task) => {
                    run(task);
                    executed += 1;
                }
                Err(_) => break,
            }
        }
        executed
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn hue_of(task: GpuTask) -> Hue {
        match task {
            GpuTask::BindPalette(hue) => hue,
            other => panic!("unexpected task {other:?}"),
        }
    }

    #[test]
    fn drains_in_submission_order_exactly_once() {
        let queue = TaskQueue::new();
        queue.enqueue(GpuTask::BindPalette(Hue::Fire));
        queue.enqueue(GpuTask::BindPalette(Hue::Ice));
        queue.enqueue(GpuTask::BindPalette(Hue::Ash));

        let mut seen = Vec::new();
        assert_eq!(queue.drain(|task| seen.push(hue_of(task))), 3);
        assert_eq!(seen, vec![Hue::Fire, Hue::Ice, Hue::Ash]);
        assert!(queue.is_empty());

        assert_eq!(queue.drain(|_| panic!("queue should be empty")), 0);
    }

    #[test]
    fn tasks_queued_during_drain_wait_for_next_frame() {
        let queue = TaskQueue::new();
        queue.enqueue(GpuTask::BindPalette(Hue::Fire));

        let requeue = queue.clone();
        let ran = queue.drain(|_| requeue.enqueue(GpuTask::BindPalette(Hue::Psychedelic)));
        assert_eq!(ran, 1);
        assert_eq!(queue.len(), 1);

        let mut seen = Vec::new();
        queue.drain(|task| seen.push(hue_of(task)));
        assert_eq!(seen, vec![Hue::Psychedelic]);
    }

    #[test]
    fn accepts_tasks_from_other_threads() {
        let queue = TaskQueue::new();
        let producers: Vec<_> = (0..4)
            .map(|index| {
                let queue = queue.clone();
                thread::spawn(move || {
                    let hue = Hue::from_index(index).unwrap();
                    for _ in 0..25 {
                        queue.enqueue(GpuTask::BindPalette(hue));
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }
        assert_eq!(queue.drain(|_| {}), 100);
    }
}

//! Auxiliary turbo-decoder worker (spec §5, §9): offloads iterative
//! decoding onto a dedicated thread, handed off through an explicit
//! `crossbeam_channel` request/reply pair rather than a polled
//! completion flag, since a flag polled without a memory fence is
//! exactly the kind of subtle synchronization bug this crate should
//! not reproduce.

use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, unbounded, Sender};

use crate::sch::turbo::{decode, DecodeOutcome};

pub struct DecodeRequest {
    pub sys_llr: Vec<f32>,
    pub par1_llr: Vec<f32>,
    pub par2_llr: Vec<f32>,
    pub k: usize,
    pub max_iterations: usize,
}

/// A single background turbo-decoder thread. Requests queue on an
/// unbounded channel; each carries its own one-shot reply sender so the
/// caller blocks only on its own job, not behind other queued work.
pub struct TurboWorker {
    sender: Option<Sender<(DecodeRequest, Sender<DecodeOutcome>)>>,
    handle: Option<JoinHandle<()>>,
}

impl TurboWorker {
    pub fn spawn() -> Self {
        let (tx, rx) = unbounded::<(DecodeRequest, Sender<DecodeOutcome>)>();
        let handle = thread::spawn(move || {
            while let Ok((req, reply)) = rx.recv() {
                let outcome = decode(&req.sys_llr, &req.par1_llr, &req.par2_llr, req.k, req.max_iterations, |_| false);
                let _ = reply.send(outcome);
            }
        });
        Self { sender: Some(tx), handle: Some(handle) }
    }

    /// Submit a decode job and block until the worker replies.
    pub fn decode_blocking(&self, request: DecodeRequest) -> DecodeOutcome {
        let (reply_tx, reply_rx) = bounded(1);
        self.sender
            .as_ref()
            .expect("worker not yet dropped")
            .send((request, reply_tx))
            .expect("turbo worker thread is still running");
        reply_rx.recv().expect("turbo worker sent a reply")
    }
}

impl Drop for TurboWorker {
    fn drop(&mut self) {
        // Drop the sender explicitly first: that closes the channel and
        // ends the worker's `recv` loop, so the subsequent join cannot
        // deadlock waiting on a request that will never come.
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sch::turbo::encode;

    #[test]
    fn worker_decodes_a_submitted_job() {
        let info: Vec<u8> = (0..32).map(|i| (i % 4 < 2) as u8).collect();
        let cw = encode(&info);
        let sign = |b: u8| if b == 0 { 1.0 } else { -1.0 };

        let worker = TurboWorker::spawn();
        let outcome = worker.decode_blocking(DecodeRequest {
            sys_llr: cw.systematic.iter().map(|&b| sign(b) * 8.0).collect(),
            par1_llr: cw.parity1.iter().map(|&b| sign(b) * 8.0).collect(),
            par2_llr: cw.parity2.iter().map(|&b| sign(b) * 8.0).collect(),
            k: info.len(),
            max_iterations: 4,
        });
        assert_eq!(outcome.bits, info);
    }
}

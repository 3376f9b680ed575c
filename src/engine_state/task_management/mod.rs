//! # Task Management System
//!
//! Hosts the [`WorldController`] on a dedicated worker thread so generation, meshing and
//! persistence never run on the consumer's thread. The consumer talks to the worker only
//! through two channels: requests in, responses out.
//!
//! ## Platform-Specific Behavior
//!
//! ### Native (Desktop) Implementation
//! - Uses `std::thread` for the worker
//!
//! ### Web (WASM) Implementation
//! - Uses the `wasm_thread` crate, which backs the thread with a Web Worker
//! - Blocking on the controller's futures is allowed there because it never runs on the
//!   browser's main thread
//!
//! ## Request Lifecycle
//! 1. The consumer sends a [`WorldRequest`] with [`WorldWorker::send`]
//! 2. The worker wakes, retries failed saves, then takes every request already queued
//! 3. Each request is handed to [`WorldController::handle_message`]
//! 4. The worker blocks on [`WorldController::settle`] until the batch's loads and saves finish
//! 5. Responses arrive on the consumer side through [`WorldWorker::try_recv`]
//!
//! Requests are handled one at a time in arrival order. The worker exits once every
//! request sender is gone.

use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::Arc;

use log::{debug, error, info};

use super::{
    persistence::ChunkPersistence,
    protocol::{WorldRequest, WorldResponse},
    world_config::WorldConfig,
    world_controller::WorldController,
};

cfg_if::cfg_if! {
    if #[cfg(target_family = "wasm")] {
        use wasm_thread::{self as thread, JoinHandle};
    } else {
        use std::thread::{self, JoinHandle};
        use std::sync::mpsc::RecvTimeoutError;
        use std::time::Duration;
    }
}

/// The consumer's end of the worker thread.
pub struct WorldWorker {
    request_sender: Sender<WorldRequest>,
    response_receiver: Receiver<WorldResponse>,
    worker: JoinHandle<()>,
}

impl WorldWorker {
    /// Starts the worker thread and the controller it owns.
    pub fn spawn(config: WorldConfig, persistence: Arc<dyn ChunkPersistence>) -> Self {
        let (request_tx, request_rx) = channel::<WorldRequest>();
        let (response_tx, response_rx) = channel::<WorldResponse>();

        let worker_loop = move || {
            let mut controller = WorldController::new(
                &config,
                config.make_generator(),
                persistence,
                response_tx,
            );
            info!(
                "World worker started (seed {:?}, {:?} terrain)",
                config.seed, config.generation
            );

            while let Ok(request) = request_rx.recv() {
                controller.retry_failed_writes();
                controller.handle_message(request);

                let mut batch = 1;
                for request in request_rx.try_iter() {
                    controller.handle_message(request);
                    batch += 1;
                }
                debug!("Handled {} requests", batch);

                pollster::block_on(controller.settle());
            }

            let pending = controller.pending_writes();
            if pending > 0 {
                error!("World worker exiting with {} unsaved chunks", pending);
            }
            info!("World worker stopped");
        };

        let worker = thread::spawn(worker_loop);

        WorldWorker {
            request_sender: request_tx,
            response_receiver: response_rx,
            worker,
        }
    }

    /// Queues a request. Returns `false` if the worker has stopped.
    pub fn send(&self, request: WorldRequest) -> bool {
        self.request_sender.send(request).is_ok()
    }

    /// Next response, if one is ready.
    pub fn try_recv(&self) -> Option<WorldResponse> {
        match self.response_receiver.try_recv() {
            Ok(response) => Some(response),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Waits up to `timeout` for the next response.
    #[cfg(not(target_family = "wasm"))]
    pub fn recv_timeout(&self, timeout: Duration) -> Option<WorldResponse> {
        match self.response_receiver.recv_timeout(timeout) {
            Ok(response) => Some(response),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Closes the request channel and waits for the worker to finish what it has queued.
    pub fn shutdown(self) {
        let WorldWorker {
            request_sender,
            worker,
            ..
        } = self;
        drop(request_sender);

        if worker.join().is_err() {
            error!("World worker panicked");
        }
    }
}

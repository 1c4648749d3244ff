//! Background mesh loading.
//!
//! A [`MeshLoader`] owns one worker thread that turns paths into
//! [`LoadedModel`]s through a [`MeshSource`]. Requests go in over a
//! `crossbeam-channel` queue; results are collected with [`MeshLoader::poll`]
//! on the simulation thread, so world mutation never leaves that thread.
//!
//! Each request yields exactly one message. When several requests for the
//! same target are in flight only the newest result is delivered.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    thread::{self, JoinHandle},
};

use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{debug, info, warn};

use crate::{
    error::{Error, Result},
    mesh::MeshNode,
};

/// Flattened scene: one entry per mesh primitive, in scene order.
#[derive(Clone, Debug, Default)]
pub struct LoadedModel {
    pub nodes: Vec<MeshNode>,
}

impl LoadedModel {
    pub fn new(nodes: Vec<MeshNode>) -> Self {
        Self { nodes }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Something that can read a model file. Runs on the loader thread.
pub trait MeshSource: Send + 'static {
    fn load(&self, path: &Path) -> Result<LoadedModel>;
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum LoadTarget {
    Track,
    /// Chassis model for the named vehicle.
    Vehicle(String),
}

#[derive(Clone, Debug)]
pub struct LoadRequest {
    pub id: u64,
    pub target: LoadTarget,
    pub path: PathBuf,
}

#[derive(Debug)]
pub struct LoadMessage {
    pub id: u64,
    pub target: LoadTarget,
    pub path: PathBuf,
    pub result: Result<LoadedModel>,
}

pub struct MeshLoader {
    requests: Option<Sender<LoadRequest>>,
    results: Receiver<LoadMessage>,
    worker: Option<JoinHandle<()>>,
    next_id: u64,
    latest: HashMap<LoadTarget, u64>,
}

impl MeshLoader {
    pub fn spawn<S: MeshSource>(source: S) -> Result<Self> {
        let (req_tx, req_rx) = unbounded::<LoadRequest>();
        let (res_tx, res_rx) = unbounded::<LoadMessage>();

        let worker = thread::Builder::new()
            .name("mesh-loader".into())
            .spawn(move || {
                while let Ok(LoadRequest { id, target, path }) = req_rx.recv() {
                    debug!("loading {} for {target:?}", path.display());
                    let result = source.load(&path);
                    if res_tx.send(LoadMessage { id, target, path, result }).is_err() {
                        break;
                    }
                }
            })
            .map_err(|e| Error::Load {
                path: PathBuf::new(),
                reason: format!("cannot start loader thread: {e}"),
            })?;

        Ok(Self {
            requests: Some(req_tx),
            results: res_rx,
            worker: Some(worker),
            next_id: 0,
            latest: HashMap::new(),
        })
    }

    /// Queue a load. Returns the request id.
    pub fn request(&mut self, target: LoadTarget, path: impl Into<PathBuf>) -> Result<u64> {
        let tx = self.requests.as_ref().ok_or(Error::LoaderClosed)?;
        self.next_id += 1;
        let id = self.next_id;
        let path = path.into();
        info!("requesting {} for {target:?}", path.display());
        tx.send(LoadRequest {
            id,
            target: target.clone(),
            path,
        })
        .map_err(|_| Error::LoaderClosed)?;
        self.latest.insert(target, id);
        Ok(id)
    }

    /// Drain finished loads without blocking. Failures are logged and still
    /// returned so the caller can keep its fallback.
    ///
    /// Only the newest request per target is delivered. Older results are
    /// dropped even if they succeeded and the newest one later fails.
    pub fn poll(&mut self) -> Vec<LoadMessage> {
        let mut out = Vec::new();
        for msg in self.results.try_iter() {
            if self.latest.get(&msg.target) != Some(&msg.id) {
                debug!("dropping superseded load {} of {}", msg.id, msg.path.display());
                continue;
            }
            self.latest.remove(&msg.target);
            if let Err(e) = &msg.result {
                warn!("load for {:?} failed: {e}", msg.target);
            }
            out.push(msg);
        }
        out
    }

    /// Requests whose result has not been delivered yet.
    pub fn pending(&self) -> usize {
        self.latest.len()
    }
}

impl Drop for MeshLoader {
    fn drop(&mut self) {
        self.requests.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("mesh loader thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;
    use std::time::{Duration, Instant};

    struct FakeSource;

    impl MeshSource for FakeSource {
        fn load(&self, path: &Path) -> Result<LoadedModel> {
            match path.to_str() {
                Some("missing.glb") => Err(Error::Load {
                    path: path.to_owned(),
                    reason: "not found".into(),
                }),
                Some(name) => Ok(LoadedModel::new(vec![MeshNode::cuboid(
                    name,
                    Vector3::new(1.0, 1.0, 1.0),
                )])),
                None => Ok(LoadedModel::default()),
            }
        }
    }

    fn wait_for(loader: &mut MeshLoader, count: usize) -> Vec<LoadMessage> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut got = Vec::new();
        while got.len() < count && Instant::now() < deadline {
            got.extend(loader.poll());
            thread::sleep(Duration::from_millis(1));
        }
        got
    }

    #[test]
    fn results_arrive_once_per_target() {
        let mut loader = MeshLoader::spawn(FakeSource).unwrap();
        let track = loader.request(LoadTarget::Track, "track.glb").unwrap();
        let car = loader
            .request(LoadTarget::Vehicle("player".into()), "car.glb")
            .unwrap();

        let msgs = wait_for(&mut loader, 2);
        assert_eq!(msgs.len(), 2);
        let ids: Vec<u64> = msgs.iter().map(|m| m.id).collect();
        assert!(ids.contains(&track) && ids.contains(&car));
        assert_eq!(loader.pending(), 0);
        assert!(loader.poll().is_empty());
    }

    #[test]
    fn failure_is_delivered_as_error() {
        let mut loader = MeshLoader::spawn(FakeSource).unwrap();
        loader.request(LoadTarget::Track, "missing.glb").unwrap();
        let msgs = wait_for(&mut loader, 1);
        assert_eq!(msgs.len(), 1);
        assert!(matches!(msgs[0].result, Err(Error::Load { .. })));
    }

    #[test]
    fn superseded_request_is_dropped() {
        let mut loader = MeshLoader::spawn(FakeSource).unwrap();
        loader.request(LoadTarget::Track, "old.glb").unwrap();
        let newest = loader.request(LoadTarget::Track, "new.glb").unwrap();

        let msgs = wait_for(&mut loader, 1);
        // Give the worker time to finish both before the final check.
        thread::sleep(Duration::from_millis(20));
        let rest = loader.poll();
        let all: Vec<_> = msgs.into_iter().chain(rest).collect();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, newest);
        assert_eq!(all[0].result.as_ref().unwrap().nodes[0].name, "new.glb");
    }

    #[test]
    fn failed_newest_request_still_supersedes_older_success() {
        let mut loader = MeshLoader::spawn(FakeSource).unwrap();
        loader.request(LoadTarget::Track, "good.glb").unwrap();
        let newest = loader.request(LoadTarget::Track, "missing.glb").unwrap();

        let msgs = wait_for(&mut loader, 1);
        thread::sleep(Duration::from_millis(20));
        let all: Vec<_> = msgs.into_iter().chain(loader.poll()).collect();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, newest);
        assert!(all[0].result.is_err());
        assert_eq!(loader.pending(), 0);
    }
}

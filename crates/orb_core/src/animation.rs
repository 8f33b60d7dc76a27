//! Frame-based sprite animation: immutable tables and per-entity playback.
//!
//! An [`AnimationTable`] is built once per archetype and shared read-only
//! (behind an `Arc`) by every entity of that archetype. Each entity owns its
//! own [`Animator`], a playback cursor over the shared table with its own
//! listener registry, so two live entities never step on each other's frames
//! or events.
//!
//! Timing is in floating-point milliseconds. `Animator::advance` performs at
//! most one frame transition per call; the tick driver bounds elapsed time
//! upstream so that a single transition is always enough.
//!
//! Frame indices are 1-based throughout, matching the authored data
//! (`loop_target: 3` means "resume at the third frame").

use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

/// How long a frame stays current.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameDuration {
    /// Positive duration in milliseconds.
    Millis(f64),
    /// The frame never ends on its own; only an animation change moves on.
    Hold,
}

/// A single frame in an animation clip.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationFrame {
    pub sprite_id: String,
    pub duration: FrameDuration,
    /// Fired exactly when this frame becomes current.
    pub start_event: Option<String>,
    /// Opaque gameplay metadata. Not interpreted by playback.
    pub flags: Vec<String>,
}

impl AnimationFrame {
    pub fn new(sprite_id: impl Into<String>, duration_ms: f64) -> Self {
        Self {
            sprite_id: sprite_id.into(),
            duration: FrameDuration::Millis(duration_ms),
            start_event: None,
            flags: Vec::new(),
        }
    }

    pub fn hold(sprite_id: impl Into<String>) -> Self {
        Self {
            sprite_id: sprite_id.into(),
            duration: FrameDuration::Hold,
            start_event: None,
            flags: Vec::new(),
        }
    }

    pub fn with_start_event(mut self, event: impl Into<String>) -> Self {
        self.start_event = Some(event.into());
        self
    }

    pub fn with_flags(mut self, flags: &[&str]) -> Self {
        self.flags = flags.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }
}

/// A named sequence of frames that either loops back to `loop_target` or
/// holds on its final frame.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    pub frames: Vec<AnimationFrame>,
    /// 1-based frame to resume at after the last frame.
    pub loop_target: Option<usize>,
    /// Fired once per wrap when looping.
    pub loop_event: Option<String>,
    /// Fired once when a non-looping clip reaches its end.
    pub finish_event: Option<String>,
}

impl AnimationClip {
    pub fn new(frames: Vec<AnimationFrame>) -> Self {
        Self {
            frames,
            loop_target: None,
            loop_event: None,
            finish_event: None,
        }
    }

    pub fn looping_from(mut self, frame: usize) -> Self {
        self.loop_target = Some(frame);
        self
    }

    pub fn with_loop_event(mut self, event: impl Into<String>) -> Self {
        self.loop_event = Some(event.into());
        self
    }

    pub fn with_finish_event(mut self, event: impl Into<String>) -> Self {
        self.finish_event = Some(event.into());
        self
    }

    /// Total duration of one full pass in milliseconds. Infinite when any
    /// frame holds.
    pub fn total_duration_ms(&self) -> f64 {
        self.frames
            .iter()
            .map(|f| match f.duration {
                FrameDuration::Millis(ms) => ms,
                FrameDuration::Hold => f64::INFINITY,
            })
            .sum()
    }
}

/// Runtime playback failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnimationError {
    #[error("unknown animation '{name}'")]
    UnknownAnimation { name: String },
    #[error("invalid frame index {index} in animation '{animation}' ({len} frames)")]
    InvalidFrameIndex {
        animation: String,
        index: usize,
        len: usize,
    },
}

/// Immutable catalog of named clips for one archetype.
#[derive(Debug, Clone, Default)]
pub struct AnimationTable {
    pub table_id: String,
    clips: Vec<AnimationClip>,
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl AnimationTable {
    pub fn new(table_id: impl Into<String>) -> Self {
        Self {
            table_id: table_id.into(),
            ..Self::default()
        }
    }

    /// Add (or replace) a clip under `name`.
    pub fn with_clip(mut self, name: impl Into<String>, clip: AnimationClip) -> Self {
        self.insert(name, clip);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, clip: AnimationClip) {
        let name = name.into();
        if let Some(&slot) = self.index.get(&name) {
            self.clips[slot] = clip;
            return;
        }
        self.index.insert(name.clone(), self.clips.len());
        self.names.push(name);
        self.clips.push(clip);
    }

    pub fn get(&self, name: &str) -> Option<&AnimationClip> {
        self.index.get(name).map(|&i| &self.clips[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Clip names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Iterate `(name, clip)` pairs in insertion order.
    pub fn clips(&self) -> impl Iterator<Item = (&str, &AnimationClip)> {
        self.names.iter().map(String::as_str).zip(self.clips.iter())
    }

    /// Every event name any clip can fire, sorted.
    pub fn event_names(&self) -> BTreeSet<&str> {
        let mut events = BTreeSet::new();
        for clip in &self.clips {
            events.extend(clip.loop_event.as_deref());
            events.extend(clip.finish_event.as_deref());
            for frame in &clip.frames {
                events.extend(frame.start_event.as_deref());
            }
        }
        events
    }

    /// Every distinct sprite id referenced by any frame, sorted.
    pub fn sprite_ids(&self) -> BTreeSet<&str> {
        self.clips
            .iter()
            .flat_map(|c| c.frames.iter().map(|f| f.sprite_id.as_str()))
            .collect()
    }

    fn slot(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Check authoring invariants: non-empty clips, positive finite
    /// durations, non-empty sprite ids and in-range loop targets.
    pub fn validate(&self) -> Result<(), String> {
        for (name, clip) in self.clips() {
            if clip.frames.is_empty() {
                return Err(format!(
                    "Animation validation failed: clip '{}' has no frames",
                    name
                ));
            }
            for (i, frame) in clip.frames.iter().enumerate() {
                if frame.sprite_id.is_empty() {
                    return Err(format!(
                        "Animation validation failed: clip '{}' frame {} has empty sprite_id",
                        name,
                        i + 1
                    ));
                }
                if let FrameDuration::Millis(ms) = frame.duration {
                    if !ms.is_finite() || ms <= 0.0 {
                        return Err(format!(
                            "Animation validation failed: clip '{}' frame {} has non-positive duration",
                            name,
                            i + 1
                        ));
                    }
                }
            }
            if let Some(target) = clip.loop_target {
                if target < 1 || target > clip.frames.len() {
                    return Err(format!(
                        "Animation validation failed: clip '{}' loop_target {} outside 1..={}",
                        name,
                        target,
                        clip.frames.len()
                    ));
                }
                if clip.finish_event.is_some() {
                    log::warn!(
                        "Clip '{}' in '{}' loops, so its finish_event never fires",
                        name,
                        self.table_id
                    );
                }
            }
        }
        Ok(())
    }
}

/// Callback invoked when an animation event fires. Identity is the `Rc`
/// allocation, so registering a clone of the same handle twice is a no-op.
pub type AnimationListener = Rc<dyn Fn()>;

#[derive(Default)]
struct ListenerRegistry {
    listeners: HashMap<String, Vec<AnimationListener>>,
}

impl ListenerRegistry {
    fn add(&mut self, event: &str, listener: AnimationListener) -> bool {
        let set = self.listeners.entry(event.to_string()).or_default();
        if set.iter().any(|l| same_listener(l, &listener)) {
            return false;
        }
        set.push(listener);
        true
    }

    fn remove(&mut self, event: &str, listener: &AnimationListener) -> bool {
        let Some(set) = self.listeners.get_mut(event) else {
            return false;
        };
        let before = set.len();
        set.retain(|l| !same_listener(l, listener));
        before != set.len()
    }

    fn snapshot(&self, event: &str) -> Vec<AnimationListener> {
        self.listeners.get(event).cloned().unwrap_or_default()
    }

    fn count(&self, event: &str) -> usize {
        self.listeners.get(event).map_or(0, Vec::len)
    }
}

fn same_listener(a: &AnimationListener, b: &AnimationListener) -> bool {
    std::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
}

/// Mutable playback cursor over a shared [`AnimationTable`].
///
/// Invariants: `frame_index` is always within `1..=frames.len()` of the
/// current clip, and `frame_progress` stays at 0 on a held frame.
pub struct Animator {
    table: Arc<AnimationTable>,
    clip_slot: usize,
    current: String,
    frame_index: usize,
    frame_progress: f64,
    finished: bool,
    listeners: ListenerRegistry,
    /// `None` unless an owner asked for events with [`Animator::buffer_events`].
    fired: Option<Vec<String>>,
}

impl fmt::Debug for Animator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Animator")
            .field("table", &self.table.table_id)
            .field("current", &self.current)
            .field("frame_index", &self.frame_index)
            .field("frame_progress", &self.frame_progress)
            .field("finished", &self.finished)
            .finish()
    }
}

impl Animator {
    /// Bind a fresh cursor to `table`, positioned on frame 1 of `initial`.
    /// No start event fires on construction.
    pub fn new(table: Arc<AnimationTable>, initial: &str) -> Result<Self, AnimationError> {
        let clip_slot = table
            .slot(initial)
            .ok_or_else(|| AnimationError::UnknownAnimation {
                name: initial.to_string(),
            })?;
        let len = table.clips[clip_slot].frames.len();
        if len == 0 {
            return Err(AnimationError::InvalidFrameIndex {
                animation: initial.to_string(),
                index: 1,
                len,
            });
        }
        Ok(Self {
            table,
            clip_slot,
            current: initial.to_string(),
            frame_index: 1,
            frame_progress: 0.0,
            finished: false,
            listeners: ListenerRegistry::default(),
            fired: None,
        })
    }

    pub fn table(&self) -> &Arc<AnimationTable> {
        &self.table
    }

    pub fn current_animation(&self) -> &str {
        &self.current
    }

    /// 1-based index of the current frame.
    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    pub fn frame_progress(&self) -> f64 {
        self.frame_progress
    }

    /// True once a non-looping clip has played out and is holding its last frame.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn animation_names(&self) -> Vec<&str> {
        self.table.names().collect()
    }

    pub fn clip(&self) -> &AnimationClip {
        &self.table.clips[self.clip_slot]
    }

    pub fn current_frame(&self) -> &AnimationFrame {
        &self.clip().frames[self.frame_index - 1]
    }

    pub fn sprite_id(&self) -> &str {
        &self.current_frame().sprite_id
    }

    pub fn current_flags(&self) -> &[String] {
        &self.current_frame().flags
    }

    /// Accumulate `elapsed_ms` and perform at most one frame transition.
    pub fn advance(&mut self, elapsed_ms: f64) -> Result<(), AnimationError> {
        if self.finished {
            return Ok(());
        }
        let duration = match self.current_frame().duration {
            FrameDuration::Hold => return Ok(()),
            FrameDuration::Millis(ms) => ms,
        };

        self.frame_progress += elapsed_ms;
        if self.frame_progress < duration {
            return Ok(());
        }

        let table = Arc::clone(&self.table);
        let clip = &table.clips[self.clip_slot];

        if self.frame_index < clip.frames.len() {
            self.frame_progress -= duration;
            return self.change_index(clip, self.frame_index + 1);
        }

        if let Some(target) = clip.loop_target {
            if target < 1 || target > clip.frames.len() {
                self.frame_progress -= elapsed_ms;
                return Err(AnimationError::InvalidFrameIndex {
                    animation: self.current.clone(),
                    index: target,
                    len: clip.frames.len(),
                });
            }
            self.frame_progress -= duration;
            if let Some(event) = &clip.loop_event {
                self.fire(event);
            }
            return self.change_index(clip, target);
        }

        self.frame_progress -= duration;
        self.finished = true;
        if let Some(event) = &clip.finish_event {
            self.fire(event);
        }
        Ok(())
    }

    /// Hard reset into `name`: frame 1, zero progress, frame 1's start event.
    pub fn change_animation(&mut self, name: &str) -> Result<(), AnimationError> {
        let slot = self
            .table
            .slot(name)
            .ok_or_else(|| AnimationError::UnknownAnimation {
                name: name.to_string(),
            })?;
        let table = Arc::clone(&self.table);
        let clip = &table.clips[slot];
        if clip.frames.is_empty() {
            return Err(AnimationError::InvalidFrameIndex {
                animation: name.to_string(),
                index: 1,
                len: 0,
            });
        }

        log::debug!("{}: {} -> {}", table.table_id, self.current, name);
        self.clip_slot = slot;
        self.current = name.to_string();
        self.frame_progress = 0.0;
        self.finished = false;
        self.change_index(clip, 1)
    }

    /// Switch to `name` unless it is already playing.
    pub fn continue_animation(&mut self, name: &str) -> Result<(), AnimationError> {
        if self.current == name {
            return Ok(());
        }
        self.change_animation(name)
    }

    /// Register `listener` for `event`. Returns false if it was already registered.
    pub fn on(&mut self, event: &str, listener: AnimationListener) -> bool {
        self.listeners.add(event, listener)
    }

    /// Unregister `listener` from `event`. Returns false if it was not registered.
    pub fn off(&mut self, event: &str, listener: &AnimationListener) -> bool {
        self.listeners.remove(event, listener)
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.count(event)
    }

    /// Start or stop recording fired event names for [`Animator::take_fired_events`].
    /// The owner must drain the buffer every tick. Stopping drops anything unread.
    pub fn buffer_events(&mut self, on: bool) {
        self.fired = if on { Some(Vec::new()) } else { None };
    }

    /// Events fired since the last call, in firing order. Always empty unless
    /// buffering is on.
    pub fn take_fired_events(&mut self) -> Vec<String> {
        self.fired.as_mut().map(std::mem::take).unwrap_or_default()
    }

    fn change_index(&mut self, clip: &AnimationClip, index: usize) -> Result<(), AnimationError> {
        if index < 1 || index > clip.frames.len() {
            return Err(AnimationError::InvalidFrameIndex {
                animation: self.current.clone(),
                index,
                len: clip.frames.len(),
            });
        }
        log::trace!("{} frame {}", self.current, index);
        self.frame_index = index;
        if let Some(event) = &clip.frames[index - 1].start_event {
            self.fire(event);
        }
        Ok(())
    }

    fn fire(&mut self, event: &str) {
        log::debug!("{}: event '{}'", self.table.table_id, event);
        for listener in self.listeners.snapshot(event) {
            listener();
        }
        if let Some(fired) = &mut self.fired {
            fired.push(event.to_string());
        }
    }
}

// --- JSON deserialization types (private) ---

#[derive(Debug, Deserialize)]
struct AnimationTableJson {
    version: String,
    table_id: String,
    animations: HashMap<String, AnimationClipJson>,
}

#[derive(Debug, Deserialize)]
struct AnimationClipJson {
    frames: Vec<AnimationFrameJson>,
    #[serde(default)]
    loop_target: Option<usize>,
    #[serde(default)]
    loop_event: Option<String>,
    #[serde(default)]
    finish_event: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnimationFrameJson {
    sprite_id: String,
    #[serde(default)]
    duration_ms: Option<f64>,
    #[serde(default)]
    hold: bool,
    #[serde(default)]
    start_event: Option<String>,
    #[serde(default)]
    flags: Vec<String>,
}

/// Load an animation table from a JSON file.
pub fn load_animation_table(path: &Path) -> Result<AnimationTable, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read animation file {}: {e}", path.display()))?;
    parse_animation_table(&raw)
        .map_err(|e| format!("Failed to load animation file {}: {e}", path.display()))
}

/// Parse and validate an animation table from JSON text. Clips are inserted
/// in name order so the resulting table is deterministic.
pub fn parse_animation_table(raw: &str) -> Result<AnimationTable, String> {
    let json: AnimationTableJson = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    if json.version != "0.1" {
        return Err(format!(
            "Animation validation failed: unsupported version '{}'",
            json.version
        ));
    }
    if json.table_id.is_empty() {
        return Err("Animation validation failed: table_id is empty".to_string());
    }

    let mut names: Vec<&String> = json.animations.keys().collect();
    names.sort();

    let mut table = AnimationTable::new(json.table_id.clone());
    for name in names {
        let clip_json = &json.animations[name];
        let mut frames = Vec::with_capacity(clip_json.frames.len());
        for (i, f) in clip_json.frames.iter().enumerate() {
            let duration = match (f.duration_ms, f.hold) {
                (Some(ms), false) => FrameDuration::Millis(ms),
                (None, true) => FrameDuration::Hold,
                _ => {
                    return Err(format!(
                        "Animation validation failed: clip '{}' frame {} needs exactly one of duration_ms or hold",
                        name,
                        i + 1
                    ))
                }
            };
            frames.push(AnimationFrame {
                sprite_id: f.sprite_id.clone(),
                duration,
                start_event: f.start_event.clone(),
                flags: f.flags.clone(),
            });
        }
        table.insert(
            name.clone(),
            AnimationClip {
                frames,
                loop_target: clip_json.loop_target,
                loop_event: clip_json.loop_event.clone(),
                finish_event: clip_json.finish_event.clone(),
            },
        );
    }

    table.validate()?;
    Ok(table)
}

//! FFI layer for the mobile/web shell
//!
//! Provides C-compatible functions over a `PracticeSession`.
//! Uses opaque pointers and C strings; results come back as JSON.

// FFI functions necessarily work with raw pointers - this is expected behavior
#![allow(clippy::not_unsafe_ptr_arg_deref)]

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::runtime::Runtime;
use tracing::{debug, error};

use crate::audio::estimate_duration_ms;
use crate::config::ProviderConfig;
use crate::scoring::boost_score;
use crate::session::PracticeSession;
use crate::types::{ProviderResult, TranscriptOrigin};

/// Origin name reported for transcripts handed in by the caller
const CALLER_ORIGIN: &str = "caller";

/// Opaque handle to a practice session
pub struct PronounceHandle {
    runtime: Runtime,
    session: PracticeSession,
    sample_rate: u32,
    last_error: Mutex<Option<String>>,
}

fn set_last_error(handle: &PronounceHandle, message: impl Into<String>) {
    *handle.last_error.lock() = Some(message.into());
}

fn clear_last_error(handle: &PronounceHandle) {
    *handle.last_error.lock() = None;
}

fn handle_ref<'a>(handle: *mut PronounceHandle) -> Option<&'a PronounceHandle> {
    unsafe { handle.as_ref() }
}

fn read_str<'a>(s: *const c_char) -> Option<&'a str> {
    if s.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(s) }.to_str().ok()
}

fn to_json_c_string<T: Serialize>(handle: &PronounceHandle, value: &T) -> *mut c_char {
    let json = match serde_json::to_string(value) {
        Ok(json) => json,
        Err(e) => {
            set_last_error(handle, format!("Failed to serialize result: {e}"));
            return ptr::null_mut();
        }
    };
    match CString::new(json) {
        Ok(cstr) => {
            clear_last_error(handle);
            cstr.into_raw()
        }
        Err(_) => ptr::null_mut(),
    }
}

// ============ Lifecycle ============

/// Create a practice session
/// config_json may be null for defaults (simulated transcription)
/// Returns null if the config is invalid or the runtime cannot start
#[unsafe(no_mangle)]
pub extern "C" fn pronounce_init(config_json: *const c_char) -> *mut PronounceHandle {
    let config = if config_json.is_null() {
        ProviderConfig::default()
    } else {
        let Some(json) = read_str(config_json) else {
            error!("Config is not valid UTF-8");
            return ptr::null_mut();
        };
        match ProviderConfig::from_json(json) {
            Ok(config) => config,
            Err(e) => {
                error!("Invalid config: {}", e);
                return ptr::null_mut();
            }
        }
    };

    let runtime = match Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create async runtime: {}", e);
            return ptr::null_mut();
        }
    };

    let handle = PronounceHandle {
        runtime,
        session: PracticeSession::new(&config),
        sample_rate: config.sample_rate,
        last_error: Mutex::new(None),
    };

    Box::into_raw(Box::new(handle))
}

/// Close the session and free the handle
#[unsafe(no_mangle)]
pub extern "C" fn pronounce_destroy(handle: *mut PronounceHandle) {
    if !handle.is_null() {
        let handle = unsafe { Box::from_raw(handle) };
        handle.session.close();
        drop(handle);
        debug!("Pronunciation session destroyed");
    }
}

// ============ Scoring ============

/// Score a transcript the caller obtained elsewhere
/// Returns AttemptOutcome JSON (caller must free with pronounce_free_string)
/// Returns null on failure
#[unsafe(no_mangle)]
pub extern "C" fn pronounce_score_transcript(
    handle: *mut PronounceHandle,
    target_word: *const c_char,
    transcript: *const c_char,
) -> *mut c_char {
    let Some(handle) = handle_ref(handle) else {
        return ptr::null_mut();
    };
    let Some(target) = read_str(target_word) else {
        set_last_error(handle, "Target word is null or not UTF-8");
        return ptr::null_mut();
    };
    // null transcript means nothing was heard
    let transcript = if transcript.is_null() {
        ""
    } else {
        let Some(text) = read_str(transcript) else {
            set_last_error(handle, "Transcript is not UTF-8");
            return ptr::null_mut();
        };
        text
    };

    let origin = TranscriptOrigin::Provider {
        name: CALLER_ORIGIN.to_string(),
    };
    match handle
        .session
        .score_transcript(target, ProviderResult::from_transcript(transcript), origin)
    {
        Ok(outcome) => to_json_c_string(handle, &outcome),
        Err(e) => {
            let message = format!("Scoring failed: {e}");
            error!("{message}");
            set_last_error(handle, message);
            ptr::null_mut()
        }
    }
}

/// Transcribe 16-bit PCM audio (mono, at the configured sample rate) and score it
/// audio may be null or empty, in which case the attempt is simulated
/// Returns AttemptOutcome JSON (caller must free with pronounce_free_string)
/// Returns null on failure
#[unsafe(no_mangle)]
pub extern "C" fn pronounce_transcribe_and_score(
    handle: *mut PronounceHandle,
    target_word: *const c_char,
    audio: *const u8,
    audio_len: usize,
) -> *mut c_char {
    let Some(handle) = handle_ref(handle) else {
        return ptr::null_mut();
    };
    let Some(target) = read_str(target_word) else {
        set_last_error(handle, "Target word is null or not UTF-8");
        return ptr::null_mut();
    };

    let audio = if audio.is_null() || audio_len == 0 {
        None
    } else {
        Some(unsafe { std::slice::from_raw_parts(audio, audio_len) }.to_vec())
    };

    if let Some(data) = &audio {
        debug!(
            "Received {} ms of audio for '{}'",
            estimate_duration_ms(data.len(), handle.sample_rate),
            target
        );
    }

    let result = handle
        .runtime
        .block_on(handle.session.transcribe_and_score(target, audio));

    match result {
        Ok(outcome) => to_json_c_string(handle, &outcome),
        Err(e) => {
            let message = format!("Attempt failed: {e}");
            error!("{message}");
            set_last_error(handle, message);
            ptr::null_mut()
        }
    }
}

/// Map a raw accuracy onto the encouragement curve
#[unsafe(no_mangle)]
pub extern "C" fn pronounce_boost_score(raw: u8) -> u8 {
    boost_score(raw)
}

// ============ Session ============

/// Forget all recorded attempts
#[unsafe(no_mangle)]
pub extern "C" fn pronounce_reset(handle: *mut PronounceHandle) {
    if let Some(handle) = handle_ref(handle) {
        handle.session.reset();
        clear_last_error(handle);
    }
}

/// Number of attempts recorded since init or the last reset
#[unsafe(no_mangle)]
pub extern "C" fn pronounce_attempt_count(handle: *mut PronounceHandle) -> usize {
    handle_ref(handle).map_or(0, |h| h.session.attempt_count())
}

// ============ Errors & Memory ============

/// Get the last error message (caller must free with pronounce_free_string)
/// Returns null if there is no error
#[unsafe(no_mangle)]
pub extern "C" fn pronounce_get_last_error(handle: *mut PronounceHandle) -> *mut c_char {
    let Some(handle) = handle_ref(handle) else {
        return ptr::null_mut();
    };
    let message = handle.last_error.lock().clone();
    match message {
        Some(text) => match CString::new(text) {
            Ok(cstr) => cstr.into_raw(),
            Err(_) => ptr::null_mut(),
        },
        None => ptr::null_mut(),
    }
}

/// Free a string returned by this library
#[unsafe(no_mangle)]
pub extern "C" fn pronounce_free_string(s: *mut c_char) {
    if !s.is_null() {
        unsafe {
            drop(CString::from_raw(s));
        }
    }
}

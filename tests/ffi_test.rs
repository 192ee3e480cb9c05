//! Integration tests for the FFI layer
//!
//! These tests verify the C-compatible functions called from the app shell.
//! Tests focus on handle lifecycle, error handling, and JSON marshalling.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use pronounce::ffi::*;

// ============ Helper Functions ============

fn c_str(s: &str) -> CString {
    CString::new(s).expect("CString creation failed")
}

fn from_c_str_and_free(ptr: *mut c_char) -> Option<String> {
    if ptr.is_null() {
        None
    } else {
        let result = unsafe { CStr::from_ptr(ptr).to_str().ok().map(String::from) };
        pronounce_free_string(ptr);
        result
    }
}

fn seeded_handle() -> *mut PronounceHandle {
    let config = c_str(r#"{"simulation_seed": 7}"#);
    let handle = pronounce_init(config.as_ptr());
    assert!(!handle.is_null());
    handle
}

fn parse(ptr: *mut c_char) -> serde_json::Value {
    let json = from_c_str_and_free(ptr).expect("expected a result");
    serde_json::from_str(&json).expect("result should be valid JSON")
}

// ============ Handle Lifecycle Tests ============

#[test]
fn test_init_and_destroy() {
    // null config uses defaults
    let handle = pronounce_init(ptr::null());
    assert!(!handle.is_null(), "pronounce_init should not return null");

    pronounce_destroy(handle);
}

#[test]
fn test_init_rejects_invalid_config() {
    let bad_json = c_str("{not json");
    assert!(pronounce_init(bad_json.as_ptr()).is_null());

    let bad_value = c_str(r#"{"timeout_ms": 0}"#);
    assert!(pronounce_init(bad_value.as_ptr()).is_null());
}

#[test]
fn test_destroy_null_handle() {
    pronounce_destroy(ptr::null_mut());
}

#[test]
fn test_multiple_init_destroy_cycles() {
    for _ in 0..5 {
        let handle = pronounce_init(ptr::null());
        assert!(!handle.is_null());
        pronounce_destroy(handle);
    }
}

// ============ Scoring Tests ============

#[test]
fn test_score_transcript_exact() {
    let handle = seeded_handle();
    let target = c_str("banana");
    let transcript = c_str("banana");

    let json = parse(pronounce_score_transcript(
        handle,
        target.as_ptr(),
        transcript.as_ptr(),
    ));
    assert_eq!(json["raw_accuracy"], 100);
    assert_eq!(json["boosted_accuracy"], 100);
    assert_eq!(json["analysis"]["overall_quality"], "excellent");
    assert_eq!(json["origin"]["kind"], "provider");
    assert_eq!(pronounce_attempt_count(handle), 1);

    pronounce_destroy(handle);
}

#[test]
fn test_score_null_transcript_is_silence() {
    let handle = seeded_handle();
    let target = c_str("cat");

    let json = parse(pronounce_score_transcript(handle, target.as_ptr(), ptr::null()));
    assert_eq!(json["raw_accuracy"], 0);
    assert_eq!(json["analysis"]["overall_quality"], "needs improvement");

    pronounce_destroy(handle);
}

#[test]
fn test_null_target_sets_last_error() {
    let handle = seeded_handle();
    let transcript = c_str("cat");

    let result = pronounce_score_transcript(handle, ptr::null(), transcript.as_ptr());
    assert!(result.is_null());

    let error = from_c_str_and_free(pronounce_get_last_error(handle));
    assert!(error.unwrap().contains("Target word"));

    pronounce_destroy(handle);
}

#[test]
fn test_invalid_utf8_transcript_sets_last_error() {
    let handle = seeded_handle();
    let target = c_str("cat");
    let transcript = CString::new(vec![0x63u8, 0xff, 0x74]).unwrap();

    let result = pronounce_score_transcript(handle, target.as_ptr(), transcript.as_ptr());
    assert!(result.is_null());
    assert_eq!(pronounce_attempt_count(handle), 0);

    let error = from_c_str_and_free(pronounce_get_last_error(handle));
    assert!(error.unwrap().contains("Transcript"));

    pronounce_destroy(handle);
}

#[test]
fn test_no_error_initially() {
    let handle = seeded_handle();
    assert!(pronounce_get_last_error(handle).is_null());
    pronounce_destroy(handle);
}

#[test]
fn test_transcribe_without_audio_simulates() {
    let handle = seeded_handle();
    let target = c_str("water");

    let json = parse(pronounce_transcribe_and_score(
        handle,
        target.as_ptr(),
        ptr::null(),
        0,
    ));
    assert_eq!(json["target_word"], "water");
    assert_eq!(json["origin"]["kind"], "simulated");
    assert!(json["alternatives"].as_array().unwrap().len() <= 3);

    let raw = json["raw_accuracy"].as_u64().unwrap();
    let boosted = json["boosted_accuracy"].as_u64().unwrap();
    assert!(raw <= 100 && boosted <= 100);

    pronounce_destroy(handle);
}

#[test]
fn test_transcribe_with_audio_but_no_backend_simulates() {
    let handle = seeded_handle();
    let target = c_str("brother");
    let audio = vec![0u8; 3200];

    let json = parse(pronounce_transcribe_and_score(
        handle,
        target.as_ptr(),
        audio.as_ptr(),
        audio.len(),
    ));
    assert_eq!(json["origin"]["kind"], "simulated");

    pronounce_destroy(handle);
}

#[test]
fn test_reset_clears_attempts() {
    let handle = seeded_handle();
    let target = c_str("cat");
    let transcript = c_str("bat");

    for _ in 0..3 {
        pronounce_free_string(pronounce_score_transcript(
            handle,
            target.as_ptr(),
            transcript.as_ptr(),
        ));
    }
    assert_eq!(pronounce_attempt_count(handle), 3);

    pronounce_reset(handle);
    assert_eq!(pronounce_attempt_count(handle), 0);

    pronounce_destroy(handle);
}

#[test]
fn test_null_handle_is_harmless() {
    let target = c_str("cat");
    assert!(pronounce_score_transcript(ptr::null_mut(), target.as_ptr(), ptr::null()).is_null());
    assert_eq!(pronounce_attempt_count(ptr::null_mut()), 0);
    assert!(pronounce_get_last_error(ptr::null_mut()).is_null());
    pronounce_reset(ptr::null_mut());
}

#[test]
fn test_boost_score() {
    assert_eq!(pronounce_boost_score(0), 0);
    assert_eq!(pronounce_boost_score(19), 19);
    assert_eq!(pronounce_boost_score(20), 45);
    assert_eq!(pronounce_boost_score(100), 100);
}

#[test]
fn test_free_null_string() {
    pronounce_free_string(ptr::null_mut());
}

// End-to-end tests for the TTS relay HTTP API
//
// Each test starts the real router on an ephemeral port with an audio
// directory of its own. Providers are in-process stubs with a fixed outcome,
// so fallback, caching and error mapping can be driven deterministically.

mod helpers;
mod test_health;
mod test_tts;
mod test_voices;

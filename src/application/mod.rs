// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer wires the other layers together for one goal each:
// training a model, generating licks, or auditing them.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No printing here (that's Layer 1)
//   - File access only through Layer 4 and 6 types
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// MIDI scores → trained weights
pub mod train_use_case;

// trained weights → new .mid licks
pub mod generate_use_case;

// generated licks vs training licks
pub mod audit_use_case;

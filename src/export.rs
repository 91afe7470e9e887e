//! Browser export: renders the persisted state as a global-assignment script.

use crate::dao::{self, StoreError, StoreResult, Workspace};

/// Regenerate `data/data.js` from the persisted state.
///
/// Records whose reward label was never populated get it filled in from their
/// flags, so exports of older state files stay consistent. Output is a single
/// `window.__GACHA_DATA__ = {...};` assignment with deterministic key order,
/// making regeneration idempotent.
pub fn generate(ws: &Workspace) -> StoreResult<()> {
    let mut state = dao::tally::load_state(ws)?;
    for user in &mut state.users {
        if user.present.trim().is_empty() {
            user.present = user.effective_label().to_string();
        }
    }

    let path = ws.data_js_path();
    let payload = serde_json::to_string(&state).map_err(|source| StoreError::Encode {
        path: path.clone(),
        source,
    })?;
    ws.write_atomic(&path, format!("window.__GACHA_DATA__ = {payload};\n").as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::{tally, testutil::temp_workspace};
    use crate::model::{Outcome, TallyState, UserRecord};
    use std::fs;

    #[test]
    fn test_export_shape_and_idempotence() {
        let ws = temp_workspace();
        let mut state = TallyState::empty_now();
        state.record_win("alice", Outcome::Hit);
        tally::save_state(&ws, &state).unwrap();

        generate(&ws).unwrap();
        let first = fs::read(ws.data_js_path()).unwrap();
        generate(&ws).unwrap();
        let second = fs::read(ws.data_js_path()).unwrap();

        assert_eq!(first, second);
        let text = String::from_utf8(first).unwrap();
        assert!(text.starts_with("window.__GACHA_DATA__ = {"));
        assert!(text.ends_with(";\n"));
        assert!(text.contains(r#""name":"alice""#));
        assert!(text.contains(r#""updatedAt""#));
    }

    #[test]
    fn test_export_heals_missing_labels() {
        let ws = temp_workspace();
        let mut stale = UserRecord::new("old-winner");
        stale.hit = 4;
        stale.flags.illust = true;
        stale.flags.gif = true;
        // present left empty, as records written before the label existed.
        let state = TallyState {
            users: vec![stale],
            updated_at: "2024-01-01T00:00:00Z".into(),
        };
        tally::save_state(&ws, &state).unwrap();

        generate(&ws).unwrap();
        let text = fs::read_to_string(ws.data_js_path()).unwrap();
        assert!(text.contains(r#""present":"Gif""#));
    }

    #[test]
    fn test_export_of_missing_state_is_empty_document() {
        let ws = temp_workspace();
        generate(&ws).unwrap();
        let text = fs::read_to_string(ws.data_js_path()).unwrap();
        assert!(text.contains(r#""users":[]"#));
    }
}

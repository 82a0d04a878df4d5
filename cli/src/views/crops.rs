use std::fmt::Write;

use farm_core::types::{Crop, CropDraft};
use farm_core::FarmApi;

use super::Slot;

#[derive(Debug, Default)]
pub struct CropListView {
    pub crops: Slot<Vec<Crop>>,
    /// Outcome of the last save or delete, shown under the table.
    pub notice: Option<String>,
}

impl CropListView {
    pub fn load(&mut self, api: &FarmApi) {
        self.crops.begin();
        let outcome = api.crops().and_then(|resp| resp.json());
        self.crops.finish(outcome, |_| "Error fetching crops.".to_string());
    }

    /// Reload the list and open crop `id` for editing. A failed load reports
    /// its own message rather than a missing record.
    pub fn editor_for(&mut self, api: &FarmApi, id: i64) -> Result<CropEditor, String> {
        self.load(api);
        if let Some(error) = &self.crops.error {
            return Err(error.clone());
        }
        self.crops
            .data
            .iter()
            .flatten()
            .find(|crop| crop.id == id)
            .map(CropEditor::edit)
            .ok_or_else(|| format!("No crop with id {id}."))
    }

    /// Validate and submit the editor, then refresh the list.
    pub fn save(&mut self, api: &FarmApi, editor: &CropEditor) {
        if let Err(missing) = editor.validate() {
            self.notice = Some(format!("Please fill in: {}", missing.join(", ")));
            return;
        }
        let outcome = match editor.editing {
            Some(id) => api.update_crop(id, &editor.draft),
            None => api.create_crop(&editor.draft),
        };
        match outcome {
            Ok(_) => {
                self.notice = Some(format!("Saved {}.", editor.draft.name));
                self.load(api);
            }
            Err(err) => {
                tracing::warn!(error = %err, "error saving crop");
                self.notice = Some("Failed to save crop. Please try again.".to_string());
            }
        }
    }

    pub fn delete(&mut self, api: &FarmApi, id: i64) {
        match api.delete_crop(id) {
            Ok(_) => {
                self.notice = Some(format!("Deleted crop {id}."));
                self.load(api);
            }
            Err(err) => {
                tracing::warn!(error = %err, id, "error deleting crop");
                self.notice = Some("Failed to delete crop. Please try again.".to_string());
            }
        }
    }

    pub fn render(&self) -> String {
        if self.crops.loading {
            return "Loading crops...".to_string();
        }
        let mut out = String::new();
        if let Some(error) = &self.crops.error {
            let _ = writeln!(out, "{error}");
        }
        match self.crops.data.as_deref() {
            Some([]) => {
                let _ = writeln!(out, "No crops added yet. Add your first crop with `farm crops add`.");
            }
            Some(crops) => {
                let _ = writeln!(
                    out,
                    "{:>4}  {:<16} {:<12} {:>8}  {:<10}  {:<10}  {}",
                    "ID", "NAME", "VARIETY", "ACRES", "PLANTED", "HARVEST", "STATUS"
                );
                for crop in crops {
                    let _ = writeln!(
                        out,
                        "{:>4}  {:<16} {:<12} {:>8}  {:<10}  {:<10}  {}",
                        crop.id,
                        crop.name,
                        crop.variety.as_deref().unwrap_or("-"),
                        crop.area,
                        crop.planting_date,
                        crop.expected_harvest_date,
                        crop.status,
                    );
                    if let Some(notes) = crop.notes.as_deref().filter(|n| !n.is_empty()) {
                        let _ = writeln!(out, "      {notes}");
                    }
                }
            }
            None => {}
        }
        if let Some(notice) = &self.notice {
            let _ = writeln!(out, "{notice}");
        }
        out
    }
}

/// Draft record for the add/edit form.
#[derive(Debug, Clone, Default)]
pub struct CropEditor {
    pub editing: Option<i64>,
    pub draft: CropDraft,
}

impl CropEditor {
    pub fn new(draft: CropDraft) -> Self {
        Self { editing: None, draft }
    }

    /// Start from an existing record.
    pub fn edit(crop: &Crop) -> Self {
        Self {
            editing: Some(crop.id),
            draft: CropDraft::from(crop),
        }
    }

    /// Required-field presence only; the server does the real validation.
    pub fn validate(&self) -> Result<(), Vec<&'static str>> {
        let required = [
            ("name", &self.draft.name),
            ("area", &self.draft.area),
            ("planting date", &self.draft.planting_date),
            ("expected harvest date", &self.draft.expected_harvest_date),
        ];
        let missing: Vec<&'static str> = required
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(label, _)| label)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(missing)
        }
    }
}

#[cfg(test)]
mod tests {
    use farm_core::types::CropStatus;
    use farm_core::HttpMethod;

    use super::*;
    use crate::views::testing::signed_in;

    const ONE_CROP: &str = r#"[{"id":3,"name":"Wheat","variety":"HD-2967","area":"2.50",
        "planting_date":"2024-11-01","expected_harvest_date":"2025-03-15","status":"growing","notes":"north field"}]"#;

    fn wheat() -> CropDraft {
        CropDraft {
            name: "Wheat".into(),
            area: "2.5".into(),
            planting_date: "2024-11-01".into(),
            expected_harvest_date: "2025-03-15".into(),
            status: CropStatus::Planted,
            ..CropDraft::default()
        }
    }

    #[test]
    fn renders_table() {
        let f = signed_in();
        f.transport.reply(200, ONE_CROP);
        let mut view = CropListView::default();
        view.load(&f.api);

        let text = view.render();
        assert!(text.contains("Wheat"));
        assert!(text.contains("HD-2967"));
        assert!(text.contains("growing"));
        assert!(text.contains("north field"));
    }

    #[test]
    fn renders_empty_state() {
        let f = signed_in();
        f.transport.reply(200, "[]");
        let mut view = CropListView::default();
        view.load(&f.api);
        assert!(view.render().starts_with("No crops added yet"));
    }

    #[test]
    fn validate_lists_missing_fields() {
        let editor = CropEditor::new(CropDraft {
            name: "Wheat".into(),
            ..CropDraft::default()
        });
        assert_eq!(
            editor.validate().unwrap_err(),
            vec!["area", "planting date", "expected harvest date"]
        );
        assert!(CropEditor::new(wheat()).validate().is_ok());
    }

    #[test]
    fn invalid_draft_is_not_submitted() {
        let f = signed_in();
        let mut view = CropListView::default();
        view.save(&f.api, &CropEditor::default());

        assert!(f.transport.sent().is_empty());
        assert!(view.notice.unwrap().starts_with("Please fill in: name"));
    }

    #[test]
    fn create_then_reload() {
        let f = signed_in();
        f.transport.reply(201, "{}").reply(200, ONE_CROP);
        let mut view = CropListView::default();
        view.save(&f.api, &CropEditor::new(wheat()));

        let sent = f.transport.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].method, HttpMethod::Post);
        assert_eq!(sent[1].method, HttpMethod::Get);
        assert_eq!(view.crops.data.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn edit_patches_existing_record() {
        let f = signed_in();
        f.transport.reply(200, "{}").reply(200, ONE_CROP);
        let crop: Vec<Crop> = serde_json::from_str(ONE_CROP).unwrap();
        let mut editor = CropEditor::edit(&crop[0]);
        editor.draft.status = CropStatus::Harvested;

        let mut view = CropListView::default();
        view.save(&f.api, &editor);

        let sent = f.transport.sent();
        assert_eq!(sent[0].method, HttpMethod::Patch);
        assert_eq!(sent[0].path, "/crops/3/");
    }

    #[test]
    fn failed_save_shows_static_message_without_retry() {
        let f = signed_in();
        f.transport.reply(400, r#"{"area":["A valid number is required."]}"#);
        let mut view = CropListView::default();
        view.save(&f.api, &CropEditor::new(wheat()));

        assert_eq!(f.transport.sent().len(), 1);
        assert_eq!(view.notice.as_deref(), Some("Failed to save crop. Please try again."));
    }

    #[test]
    fn editor_for_opens_existing_record() {
        let f = signed_in();
        f.transport.reply(200, ONE_CROP);
        let mut view = CropListView::default();

        let editor = view.editor_for(&f.api, 3).unwrap();
        assert_eq!(editor.editing, Some(3));
        assert_eq!(editor.draft.name, "Wheat");
    }

    #[test]
    fn editor_for_reports_failed_load_instead_of_missing_record() {
        let f = signed_in();
        f.transport.reply(500, "");
        let mut view = CropListView::default();

        assert_eq!(view.editor_for(&f.api, 3).unwrap_err(), "Error fetching crops.");
    }

    #[test]
    fn editor_for_unknown_id() {
        let f = signed_in();
        f.transport.reply(200, "[]");
        let mut view = CropListView::default();

        assert_eq!(view.editor_for(&f.api, 9).unwrap_err(), "No crop with id 9.");
    }

    #[test]
    fn delete_then_reload() {
        let f = signed_in();
        f.transport.reply(204, "").reply(200, "[]");
        let mut view = CropListView::default();
        view.delete(&f.api, 3);

        let sent = f.transport.sent();
        assert_eq!(sent[0].method, HttpMethod::Delete);
        assert_eq!(sent[0].path, "/crops/3/");
        assert_eq!(view.notice.as_deref(), Some("Deleted crop 3."));
    }
}

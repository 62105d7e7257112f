use slotdesk_shared::{
    ReferenceAddRequest, ReferenceDeleteRequest, ReferenceItemDto, ReferenceKind, ReferencesDto,
    SuccessResponse,
};
use tracing::{debug, info, instrument, warn};

use crate::api::Backend;
use crate::error::{PanelResult, ValidationError};
use crate::sequencer::{RequestSequencer, Ticket};

pub const MAX_VALUE_CHARS: usize = 100;
pub const MAX_DESCRIPTION_CHARS: usize = 255;

/// Lookup tables backing the task form selects. Always replaced wholesale
/// from the backend; inactive items stay cached so stored values remain
/// viewable.
#[derive(Debug, Clone)]
pub struct ReferenceCache {
    refs: ReferencesDto,
    loaded: bool,
    sequencer: RequestSequencer,
}

impl Default for ReferenceCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceCache {
    pub fn new() -> Self {
        Self {
            refs: ReferencesDto::default(),
            loaded: false,
            sequencer: RequestSequencer::new("references"),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn updated_at(&self) -> Option<&str> {
        self.refs.updated_at.as_deref()
    }

    pub fn items(&self, kind: ReferenceKind) -> &[ReferenceItemDto] {
        self.refs.items(kind)
    }

    /// Items offered as fresh choices: everything not explicitly inactive.
    pub fn selectable(&self, kind: ReferenceKind) -> Vec<&ReferenceItemDto> {
        self.refs
            .items(kind)
            .iter()
            .filter(|item| item.is_selectable())
            .collect()
    }

    pub fn find_value(&self, kind: ReferenceKind, value: &str) -> Option<&ReferenceItemDto> {
        self.refs.items(kind).iter().find(|item| item.value == value)
    }

    pub fn begin_load(&mut self) -> Ticket {
        self.sequencer.issue()
    }

    pub fn apply_snapshot(&mut self, ticket: Ticket, refs: ReferencesDto) -> bool {
        if !self.sequencer.accept(ticket) {
            return false;
        }
        debug!(
            updated_at = refs.updated_at.as_deref().unwrap_or("-"),
            "applied reference snapshot"
        );
        self.refs = refs;
        self.loaded = true;
        true
    }

    #[instrument(skip(self, backend))]
    pub async fn load<B>(&mut self, backend: &B) -> PanelResult<()>
    where
        B: Backend + ?Sized,
    {
        let ticket = self.begin_load();
        let refs = backend.list_references().await?;
        self.apply_snapshot(ticket, refs);
        Ok(())
    }

    /// Loads the cache only if it has never been loaded.
    pub async fn ensure_loaded<B>(&mut self, backend: &B) -> PanelResult<()>
    where
        B: Backend + ?Sized,
    {
        if self.loaded {
            return Ok(());
        }
        self.load(backend).await
    }

    /// Validates and submits a new item. The cache is not touched here;
    /// callers reload it once the backend has accepted the item.
    #[instrument(skip(self, backend, description))]
    pub async fn add<B>(
        &self,
        backend: &B,
        kind: ReferenceKind,
        value: &str,
        description: &str,
    ) -> PanelResult<SuccessResponse>
    where
        B: Backend + ?Sized,
    {
        let request = validate_new_item(kind, value, description)?;
        let response = backend.add_reference(&request).await.map_err(|err| {
            warn!(kind = %kind, status = ?err.status_code(), "reference add rejected");
            err
        })?;
        info!(kind = %kind, value = %request.value, "reference item added");
        Ok(response)
    }

    #[instrument(skip(self, backend))]
    pub async fn delete<B>(
        &self,
        backend: &B,
        kind: ReferenceKind,
        item_id: &str,
    ) -> PanelResult<SuccessResponse>
    where
        B: Backend + ?Sized,
    {
        let request = ReferenceDeleteRequest {
            kind,
            item_id: item_id.to_string(),
        };
        let response = backend.delete_reference(&request).await?;
        info!(kind = %kind, item_id, "reference item deleted");
        Ok(response)
    }
}

/// Trims and length-checks a new item before it is sent.
pub fn validate_new_item(
    kind: ReferenceKind,
    value: &str,
    description: &str,
) -> Result<ReferenceAddRequest, ValidationError> {
    let value = value.trim();
    let description = description.trim();

    if value.is_empty() {
        return Err(ValidationError::Required("value"));
    }
    if value.chars().count() > MAX_VALUE_CHARS {
        return Err(ValidationError::TooLong {
            field: "value",
            max: MAX_VALUE_CHARS,
        });
    }
    if description.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(ValidationError::TooLong {
            field: "description",
            max: MAX_DESCRIPTION_CHARS,
        });
    }

    Ok(ReferenceAddRequest {
        kind,
        value: value.to_string(),
        description: description.to_string(),
    })
}

pub fn option_label(item: &ReferenceItemDto) -> String {
    if item.description.is_empty() {
        item.value.clone()
    } else {
        format!("{} - {}", item.value, item.description)
    }
}

#[cfg(test)]
mod tests {
    use slotdesk_shared::{ReferenceItemDto, ReferenceKind};

    use super::{MAX_VALUE_CHARS, option_label, validate_new_item};
    use crate::error::ValidationError;

    #[test]
    fn value_is_trimmed_and_required() {
        let req = validate_new_item(ReferenceKind::Drivers, "  Ivanov ", " night ").expect("valid");
        assert_eq!(req.value, "Ivanov");
        assert_eq!(req.description, "night");

        let err = validate_new_item(ReferenceKind::Drivers, "   ", "").expect_err("blank");
        assert_eq!(err, ValidationError::Required("value"));
    }

    #[test]
    fn length_limits_count_characters() {
        let cyrillic = "Ж".repeat(MAX_VALUE_CHARS);
        assert!(validate_new_item(ReferenceKind::Autos, &cyrillic, "").is_ok());

        let long = "x".repeat(MAX_VALUE_CHARS + 1);
        assert!(matches!(
            validate_new_item(ReferenceKind::Autos, &long, ""),
            Err(ValidationError::TooLong { field: "value", .. })
        ));

        let long_desc = "d".repeat(256);
        assert!(matches!(
            validate_new_item(ReferenceKind::Autos, "A1", &long_desc),
            Err(ValidationError::TooLong {
                field: "description",
                ..
            })
        ));
    }

    #[test]
    fn label_includes_description_when_present() {
        let mut item = ReferenceItemDto {
            value: "10:00-12:00".to_string(),
            ..ReferenceItemDto::default()
        };
        assert_eq!(option_label(&item), "10:00-12:00");
        item.description = "morning".to_string();
        assert_eq!(option_label(&item), "10:00-12:00 - morning");
    }
}

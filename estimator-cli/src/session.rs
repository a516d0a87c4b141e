//! Calculator session state.
//!
//! Drives one operator through the estimate flow: enter area and project
//! type, calculate, pick materials, save. The session owns all working
//! state; the only async work is submitting a save, which is split out
//! into [`SaveRequest`] so the session is not borrowed while the store is
//! being written.

use estimator_core::calculations::{
    Estimate, EstimateSnapshot, compute_base_cost, parse_area, total_cost,
};
use estimator_core::{
    Catalog, EstimatorRepository, Locale, OwnerId, Project, ProjectSaver, ProjectType, SaveError,
    Selection, SelectionError,
};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("invalid area '{0}': enter a number greater than zero")]
    InvalidArea(String),

    #[error("calculate the estimate first")]
    NotCalculated,

    #[error("material {0} is not in the catalog")]
    UnknownMaterial(i64),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error("the total cost is too large to compute")]
    AmountTooLarge,

    #[error("a save is already in progress")]
    SaveInProgress,

    #[error(transparent)]
    Save(#[from] SaveError),
}

/// Where the operator currently is in the flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FlowStep {
    #[default]
    Form,
    MaterialsModal,
    SaveModal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Info,
    Success,
    Error,
}

/// A line item as shown to the operator, named in the current locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItemView {
    pub material_id: i64,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// An accepted save, detached from the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    owner: Option<OwnerId>,
    name: String,
    snapshot: EstimateSnapshot,
}

impl SaveRequest {
    pub fn snapshot(&self) -> &EstimateSnapshot {
        &self.snapshot
    }

    pub async fn submit<R>(
        &self,
        saver: &ProjectSaver<'_, R>,
    ) -> Result<Project, SaveError>
    where
        R: EstimatorRepository + ?Sized,
    {
        saver
            .save_project(self.owner.as_ref(), &self.name, &self.snapshot)
            .await
    }
}

#[derive(Debug, Clone)]
pub struct CalculatorSession {
    catalog: Catalog,
    locale: Locale,
    area_input: String,
    estimate: Estimate,
    selection: Selection,
    step: FlowStep,
    save_pending: bool,
    last_saved: Option<Project>,
    status_message: Option<(String, MessageType)>,
}

impl CalculatorSession {
    pub fn new(
        catalog: Catalog,
        locale: Locale,
    ) -> Self {
        Self {
            catalog,
            locale,
            area_input: String::new(),
            estimate: Estimate::new(),
            selection: Selection::new(),
            step: FlowStep::Form,
            save_pending: false,
            last_saved: None,
            status_message: None,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn set_locale(
        &mut self,
        locale: Locale,
    ) {
        self.locale = locale;
    }

    pub fn area_input(&self) -> &str {
        &self.area_input
    }

    pub fn project_type(&self) -> ProjectType {
        self.estimate.project_type()
    }

    pub fn step(&self) -> FlowStep {
        self.step
    }

    pub fn is_calculated(&self) -> bool {
        self.estimate.is_calculated()
    }

    pub fn is_saving(&self) -> bool {
        self.save_pending
    }

    pub fn last_saved(&self) -> Option<&Project> {
        self.last_saved.as_ref()
    }

    pub fn status_message(&self) -> Option<(&str, MessageType)> {
        self.status_message
            .as_ref()
            .map(|(text, kind)| (text.as_str(), *kind))
    }

    fn show_message(
        &mut self,
        msg: impl Into<String>,
        msg_type: MessageType,
    ) {
        self.status_message = Some((msg.into(), msg_type));
    }

    /// Replaces the area text. Any change invalidates the calculation and
    /// returns to the form; the material selection is kept.
    pub fn set_area(
        &mut self,
        text: &str,
    ) {
        if self.area_input == text {
            return;
        }
        self.area_input = text.to_string();
        self.estimate.set_area(parse_area(text));
        self.estimate.reset();
        self.step = FlowStep::Form;
        debug!(area = text, "area changed, estimate reset");
    }

    pub fn set_project_type(
        &mut self,
        project_type: ProjectType,
    ) {
        if self.estimate.project_type() == project_type {
            return;
        }
        self.estimate.set_project_type(project_type);
        self.step = FlowStep::Form;
        debug!(%project_type, "project type changed, estimate reset");
    }

    /// Computes the base cost from the current inputs and opens material
    /// selection. An unparseable or non-positive area changes nothing, and
    /// neither does one whose cost does not fit.
    pub fn calculate(&mut self) -> Result<Decimal, SessionError> {
        let invalid = || SessionError::InvalidArea(self.area_input.clone());
        let area = parse_area(&self.area_input).ok_or_else(invalid)?;
        let project_type = self.estimate.project_type();
        let base = compute_base_cost(area, project_type).ok_or_else(invalid)?;
        total_cost(base, self.selection.materials_cost()).ok_or(SessionError::AmountTooLarge)?;

        self.estimate.calculate(area, project_type);
        self.step = FlowStep::MaterialsModal;
        debug!(%area, %base, "estimate calculated");
        Ok(base)
    }

    pub fn select_material(
        &mut self,
        material_id: i64,
    ) -> Result<u32, SessionError> {
        let material = self
            .catalog
            .get(material_id)
            .ok_or(SessionError::UnknownMaterial(material_id))?;
        let before = self.selection.clone();
        let quantity = self.selection.add(material, self.locale)?.quantity;
        self.keep_total_in_range(before)?;
        Ok(quantity)
    }

    /// Overwrites a line item's quantity; zero or less removes it.
    pub fn set_quantity(
        &mut self,
        material_id: i64,
        quantity: i64,
    ) -> Result<(), SessionError> {
        let before = self.selection.clone();
        self.selection.set_quantity(material_id, quantity)?;
        self.keep_total_in_range(before)
    }

    /// Restores `before` when base plus materials no longer fits.
    fn keep_total_in_range(
        &mut self,
        before: Selection,
    ) -> Result<(), SessionError> {
        if self.estimate.total_cost(&self.selection).is_none() {
            self.selection = before;
            return Err(SessionError::AmountTooLarge);
        }
        Ok(())
    }

    pub fn remove_material(
        &mut self,
        material_id: i64,
    ) {
        self.selection.remove(material_id);
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Selected line items in selection order, named in the current locale.
    ///
    /// Falls back to the name captured at selection time for materials no
    /// longer in the catalog.
    pub fn selection_view(&self) -> Vec<LineItemView> {
        self.selection
            .items()
            .map(|item| LineItemView {
                material_id: item.material_id,
                name: self
                    .catalog
                    .display_name(item.material_id, self.locale)
                    .unwrap_or(&item.name)
                    .to_string(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                line_total: item.line_total,
            })
            .collect()
    }

    pub fn base_cost(&self) -> Decimal {
        self.estimate.base_cost()
    }

    pub fn materials_cost(&self) -> Decimal {
        self.estimate.materials_cost(&self.selection)
    }

    /// `None` only if base plus materials does not fit, which the
    /// selection methods refuse to let happen.
    pub fn total_cost(&self) -> Option<Decimal> {
        self.estimate.total_cost(&self.selection)
    }

    pub fn open_save_dialog(&mut self) -> Result<(), SessionError> {
        if !self.estimate.is_calculated() {
            return Err(SessionError::NotCalculated);
        }
        self.step = FlowStep::SaveModal;
        Ok(())
    }

    /// Closes the topmost dialog.
    pub fn close_dialog(&mut self) {
        self.step = match self.step {
            FlowStep::SaveModal => FlowStep::MaterialsModal,
            FlowStep::MaterialsModal | FlowStep::Form => FlowStep::Form,
        };
    }

    /// Accepts a save and latches the session until [`Self::finish_save`].
    pub fn begin_save(
        &mut self,
        name: &str,
        owner: Option<&OwnerId>,
    ) -> Result<SaveRequest, SessionError> {
        if self.save_pending {
            return Err(SessionError::SaveInProgress);
        }
        let snapshot = self
            .estimate
            .snapshot(&self.selection)
            .ok_or(SessionError::NotCalculated)?;

        self.save_pending = true;
        Ok(SaveRequest {
            owner: owner.cloned(),
            name: name.to_string(),
            snapshot,
        })
    }

    /// Releases the latch and records the outcome.
    ///
    /// On failure the estimate, selection and open dialog are left as they
    /// were so the operator can retry.
    pub fn finish_save(
        &mut self,
        result: Result<Project, SaveError>,
    ) -> Result<Project, SessionError> {
        self.save_pending = false;
        match result {
            Ok(project) => {
                info!(project_id = project.id, "save completed");
                self.step = FlowStep::Form;
                self.show_message(
                    format!("Project '{}' saved", project.name),
                    MessageType::Success,
                );
                self.last_saved = Some(project.clone());
                Ok(project)
            }
            Err(error) => {
                warn!(%error, "save failed");
                self.show_message(error.to_string(), MessageType::Error);
                Err(SessionError::Save(error))
            }
        }
    }

    pub async fn save<R>(
        &mut self,
        name: &str,
        owner: Option<&OwnerId>,
        saver: &ProjectSaver<'_, R>,
    ) -> Result<Project, SessionError>
    where
        R: EstimatorRepository + ?Sized,
    {
        let request = self.begin_save(name, owner)?;
        let result = request.submit(saver).await;
        self.finish_save(result)
    }
}

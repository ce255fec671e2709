use truck_modeling::topology::Solid;
use truck_stepio::out::{CompleteStepDisplay, StepHeaderDescriptor, StepModel};

/// Serialize a solid as an ISO 10303-21 exchange file.
pub fn export_step(solid: &Solid) -> String {
    let compressed = solid.compress();
    let header = StepHeaderDescriptor {
        organization_system: "cadmesh".to_owned(),
        ..Default::default()
    };
    CompleteStepDisplay::new(StepModel::from(&compressed), header).to_string()
}

use clap::Args;
use dashboard_core::{
    widget::{select_all_hospitals, unselect_all_hospitals},
    FilterControls, HospitalPicker, MultiSelectWidget,
};

/// Filter controls as command line flags. Omitted flags read as absent controls.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    #[arg(long)]
    pub escalation: Option<String>,
    /// Nurse email, or `all`.
    #[arg(long)]
    pub email: Option<String>,
    /// Selected hospital; repeat to select several, in order.
    #[arg(long = "hospital")]
    pub hospitals: Vec<String>,
    #[command(flatten)]
    pub available: AvailableHospitals,
    /// YYYY-MM-DD
    #[arg(long)]
    pub start_date: Option<String>,
    /// YYYY-MM-DD
    #[arg(long)]
    pub end_date: Option<String>,
    #[arg(long)]
    pub exclude_camera: bool,
    /// Select every offered hospital; the filters are applied on that change.
    #[arg(long, conflicts_with_all = ["hospitals", "unselect_all_hospitals"])]
    pub select_all_hospitals: bool,
    /// Clear the hospital selection; the filters are applied on that change.
    #[arg(long, conflicts_with = "hospitals")]
    pub unselect_all_hospitals: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct AvailableHospitals {
    /// Every hospital the picker offers; repeat per hospital.
    #[arg(long = "available-hospital")]
    pub names: Vec<String>,
}

impl AvailableHospitals {
    /// Picker over the offered hospitals, everything selected.
    pub fn picker(&self, extra: &[String]) -> HospitalPicker {
        let mut options = self.names.clone();
        for name in extra {
            if !options.contains(name) {
                options.push(name.clone());
            }
        }
        HospitalPicker::new(options)
    }
}

impl FilterArgs {
    pub fn picker(&self) -> HospitalPicker {
        let picker = self.available.picker(&self.hospitals);
        if !self.hospitals.is_empty() {
            picker.set_selection(self.hospitals.clone());
        }
        picker
    }

    /// Picker button to press before applying, if any.
    pub fn hospital_action(&self) -> Option<fn(&dyn MultiSelectWidget)> {
        if self.select_all_hospitals {
            Some(select_all_hospitals)
        } else if self.unselect_all_hospitals {
            Some(unselect_all_hospitals)
        } else {
            None
        }
    }
}

impl FilterControls for FilterArgs {
    fn escalation(&self) -> Option<String> {
        self.escalation.clone()
    }

    fn nurse_email(&self) -> Option<String> {
        self.email.clone()
    }

    fn start_date(&self) -> Option<String> {
        self.start_date.clone()
    }

    fn end_date(&self) -> Option<String> {
        self.end_date.clone()
    }

    fn exclude_camera_annotations(&self) -> Option<bool> {
        Some(self.exclude_camera)
    }
}

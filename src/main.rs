#![allow(non_snake_case)]

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPlugin, EguiContextPass};

mod camera;
use camera::CameraPlugin;
mod config;
use config::LanyardSettings;
mod error;
mod lanyard;
use lanyard::{Lanyard, LanyardPlugin, curve::CurveType, drag::DragState};
mod physics;
use physics::{PhysicsPlugin, rb_system::RigidbodySystem3D};

fn main()
{
  App::new()
    .add_plugins((DefaultPlugins, MeshPickingPlugin))
    .add_plugins(PhysicsPlugin)
    .add_plugins(CameraPlugin)
    .add_plugins(LanyardPlugin)
    .add_plugins(EguiPlugin { enable_multipass_for_primary_context: true })
    .add_systems(EguiContextPass, inspector)
    .run();
}

fn inspector(mut contexts: EguiContexts,
             mut settings: ResMut<LanyardSettings>,
             mut system: ResMut<RigidbodySystem3D>,
             lanyard: Res<Lanyard>)
{
  egui::Window::new("Lanyard").show(contexts.ctx_mut(), |ui| {
    match lanyard.drag.state()
    {
      DragState::Idle => ui.label("drag: idle"),
      DragState::Dragging { grab_offset } => ui.label(format!("drag: grabbed at {grab_offset:.2}")),
    };
    if let Ok(chain) = lanyard.chain()
    {
      ui.label(format!("rope stretch: {:.5}", chain.max_rope_stretch(&system)));
    }
    ui.separator();

    ui.add(egui::Slider::new(&mut settings.settling_factor, 0.0..=1.0).text("settling"));
    ui.add(egui::Slider::new(&mut settings.unproject_depth, 0.0..=1.0).text("unproject depth"));
    egui::ComboBox::from_label("curve")
      .selected_text(format!("{:?}", settings.curve_type))
      .show_ui(ui, |ui| {
        ui.selectable_value(&mut settings.curve_type, CurveType::Centripetal, "Centripetal");
        ui.selectable_value(&mut settings.curve_type, CurveType::Chordal, "Chordal");
        ui.selectable_value(&mut settings.curve_type, CurveType::CatmullRom { tension: 0.5 }, "CatmullRom");
      });
    ui.separator();

    ui.add(egui::Slider::new(&mut system.gravity.g, 0.0..=80.0).text("gravity"));
    ui.add(egui::Slider::new(&mut system.damping.linear, 0.0..=10.0).text("linear damping"));
    ui.add(egui::Slider::new(&mut system.damping.angular, 0.0..=10.0).text("angular damping"));
    ui.add(egui::Slider::new(&mut system.solver_iterations, 1..=32).text("solver iterations"));
    ui.add(egui::Slider::new(&mut system.substeps, 1..=16).text("substeps"));
    ui.checkbox(&mut settings.debug_draw, "debug gizmos");
  });
}

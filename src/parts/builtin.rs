use super::{BodyDefinition, ConnectionDefinition, PartModule, PartRegistry};

/// Parts available without loading anything from disk.
pub fn builtin_modules() -> Vec<(&'static str, PartModule)> {
    vec![
        ("Box", PartModule::Body(BodyDefinition::rectangle("Box", 80.0, 80.0).with_material(0.1, 0.5))),
        ("Ball", PartModule::Body(BodyDefinition::circle("Ball", 40.0).with_material(0.1, 0.8))),
        ("Rope", PartModule::Connection(ConnectionDefinition::new("Rope"))),
    ]
}

pub fn register_builtins(registry: &mut PartRegistry) {
    for (id, module) in builtin_modules() {
        registry.register(id, module.into_kind());
    }
}

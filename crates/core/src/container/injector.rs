use crate::composition::{LayerEntry, ResolvedComposition};
use crate::container::{Binder, Container, ContainerBuilder};
use crate::errors::ConstructionError;
use std::collections::HashMap;

/// Turns a resolved composition into a live service graph
pub trait Injector: Send + Sync {
    fn construct(&self, composition: &ResolvedComposition) -> Result<Container, ConstructionError>;
}

/// Applies each layer's override chain on top of its base, then joins the layers
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultInjector;

impl Injector for DefaultInjector {
    fn construct(&self, composition: &ResolvedComposition) -> Result<Container, ConstructionError> {
        let mut builder = ContainerBuilder::new();
        // keyed by registration index; later layers reuse the first configuration
        let mut configured: HashMap<usize, Binder> = HashMap::new();

        for layer in composition.layers() {
            let mut binder = configure_once(layer.base(), &mut configured)?;

            for entry in layer.override_chain() {
                binder.apply_override(configure_once(entry, &mut configured)?);
            }

            builder.add_layer(binder)?;
        }

        tracing::debug!("Constructed container from {} layers", builder.layer_count());
        Ok(builder.build())
    }
}

fn configure_once(
    entry: &LayerEntry,
    configured: &mut HashMap<usize, Binder>,
) -> Result<Binder, ConstructionError> {
    if let Some(first) = configured.get(&entry.registration_index()) {
        return Ok(first.share_contributions());
    }

    let mut binder = Binder::new(entry.unit_type());
    entry.unit().configure(&mut binder)?;
    configured.insert(entry.registration_index(), binder.share_contributions());
    Ok(binder)
}

impl<F> Injector for F
where
    F: Fn(&ResolvedComposition) -> Result<Container, ConstructionError> + Send + Sync,
{
    fn construct(&self, composition: &ResolvedComposition) -> Result<Container, ConstructionError> {
        self(composition)
    }
}

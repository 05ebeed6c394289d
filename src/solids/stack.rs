// The layered subsurface below an overland cell or a channel node. The
// last element of `layers` is the active surface layer: erosion draws
// mass and bulk volume out of it, deposition adds both back. A layer
// whose volume runs out is popped so the layer beneath becomes the
// active surface.

use crate::solids::class::SolidsCatalog;

#[derive(Debug, Clone, Default)]
pub struct SedimentLayer {
    pub volume: f64,   //bulk volume (m3)
    pub bed_area: f64, //plan area of the layer (m2)
    pub porosity: f64,
    /// Concentration per class (g per m3 of bulk volume); slot 0 holds
    /// the total over classes.
    pub conc: Vec<f64>,
}

impl SedimentLayer {
    pub fn new(volume: f64, bed_area: f64, porosity: f64, n_classes: usize) -> SedimentLayer {
        SedimentLayer {
            volume,
            bed_area,
            porosity,
            conc: vec![0.0; n_classes + 1],
        }
    }

    /// Fill the layer with a grain size distribution: fractions per class
    /// (summing to 1) of a fully packed bed at the layer porosity.
    pub fn fill_from_fractions(&mut self, fractions: &[f64], catalog: &SolidsCatalog) {
        let n = catalog.n_classes();
        self.conc[0] = 0.0;
        for s in 1..=n {
            //bulk density (kg/m3) to g/m3 of bulk volume
            let density = catalog.class(s).bulk_density(self.porosity) * 1000.0;
            self.conc[s] = fractions[s - 1] * density;
            self.conc[0] += self.conc[s];
        }
    }

    /// Mass of one class in the layer (g).
    pub fn mass(&self, class: usize) -> f64 {
        self.conc[class] * self.volume
    }

    fn recompute_total(&mut self) {
        self.conc[0] = self.conc[1..].iter().sum();
    }
}

#[derive(Debug, Clone, Default)]
pub struct SedimentStack {
    pub layers: Vec<SedimentLayer>,
}

impl SedimentStack {
    pub fn single_layer(layer: SedimentLayer) -> SedimentStack {
        SedimentStack {
            layers: vec![layer],
        }
    }

    pub fn surface(&self) -> Option<&SedimentLayer> {
        self.layers.last()
    }

    pub fn surface_mut(&mut self) -> Option<&mut SedimentLayer> {
        self.layers.last_mut()
    }

    /// Total mass of one class over all layers (g).
    pub fn total_mass(&self, class: usize) -> f64 {
        self.layers.iter().map(|l| l.mass(class)).sum()
    }

    /// Apply one step of bed exchange to the surface layer:
    /// `eroded_mass[s]` (g) leaves the layer, `deposited_mass[s]` (g)
    /// enters it, and bulk volume follows each class at its dry bulk
    /// density. An exhausted layer is popped to expose the one beneath.
    pub fn apply_exchange(
        &mut self,
        eroded_mass: &[f64],
        deposited_mass: &[f64],
        catalog: &SolidsCatalog,
    ) {
        let n = catalog.n_classes();
        let layer = match self.layers.last_mut() {
            Some(l) => l,
            None => return,
        };

        let mut new_volume = layer.volume;
        let mut masses = vec![0.0; n + 1];
        for s in 1..=n {
            let density = catalog.class(s).bulk_density(layer.porosity) * 1000.0; //g/m3 bulk
            let delta = deposited_mass[s] - eroded_mass[s];
            masses[s] = (layer.mass(s) + delta).max(0.0);
            if density > 0.0 {
                new_volume += delta / density;
            }
        }

        if new_volume <= 0.0 {
            //surface layer exhausted: expose the next one down
            self.layers.pop();
            return;
        }

        layer.volume = new_volume;
        for s in 1..=n {
            layer.conc[s] = masses[s] / new_volume;
        }
        layer.recompute_total();
    }

    /// Mass-weighted mean particle diameter of the surface layer (m).
    /// Defaults to 1 mm when the surface layer is absent or empty.
    pub fn surface_d50(&self, catalog: &SolidsCatalog) -> f64 {
        match self.surface() {
            Some(layer) if layer.conc[0] > 0.0 => {
                let mut d50 = 0.0;
                for s in 1..=catalog.n_classes() {
                    d50 += catalog.class(s).ds * layer.conc[s] / layer.conc[0];
                }
                d50
            }
            _ => 0.001,
        }
    }
}

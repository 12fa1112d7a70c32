//! Solver control file (`system/fvSolution`).
//!
//! Multi-region cases get one global file carrying only the outer
//! corrector count, plus one file per region. Single-region cases get a
//! single region file at `system/fvSolution`.

use std::sync::Arc;

use tracing::debug;

use crate::core::builder::{AuxSink, DocumentBuilder};
use crate::core::config_db::{
    ConfigDb, keys, require, require_capability, require_choice, require_vector,
};
use crate::core::dictionary::{Dictionary, FoamDocument, FoamHeader, Value, region_location};
use crate::core::error::BuildError;
use crate::core::types::{CouplingScheme, Phase, Region};

const OBJECT: &str = "fvSolution";
const TURBULENCE_FIELDS: &str = "\"(k|epsilon|omega|nuTilda)\"";

pub struct FvSolutionBuilder<'a> {
    db: &'a dyn ConfigDb,
    target: Target<'a>,
}

enum Target<'a> {
    Global,
    Region {
        region: &'a Region,
        multi_region: bool,
    },
}

impl<'a> FvSolutionBuilder<'a> {
    /// Top-level file of a multi-region case.
    pub fn global(db: &'a dyn ConfigDb) -> Result<Self, BuildError> {
        require_capability(db)?;
        Ok(Self {
            db,
            target: Target::Global,
        })
    }

    pub fn region(
        db: &'a dyn ConfigDb,
        region: &'a Region,
        multi_region: bool,
    ) -> Result<Self, BuildError> {
        require_capability(db)?;
        Ok(Self {
            db,
            target: Target::Region {
                region,
                multi_region,
            },
        })
    }

    fn word(&self, path: &str) -> Result<Value, BuildError> {
        require(self.db, path).map(Value::Word)
    }

    fn build_region(&self, region: &Region, multi_region: bool) -> Result<Dictionary, BuildError> {
        let fluid = region.phase == Phase::Fluid;
        let scheme: CouplingScheme =
            require_choice(self.db, keys::COUPLING_SCHEME, OBJECT, &region.name)?;
        let consistent = yes_no(scheme == CouplingScheme::Simplec && fluid);
        let momentum_predictor = match require(self.db, keys::USE_MOMENTUM_PREDICTOR)?.as_str() {
            "false" => "off",
            _ => "on",
        };
        let energy = self.energy_on()?;

        let mut simple = Dictionary::new()
            .with("consistent", consistent)
            .with("nNonOrthogonalCorrectors", 0);
        if fluid {
            simple.insert("pRefPoint", self.reference_point()?);
            simple.insert("pRefValue", self.word(keys::REFERENCE_PRESSURE)?);
        }
        simple.insert("solveEnergy", yes_no(energy));
        simple.insert("residualControl", self.residual_control(energy, false)?);

        let mut pimple = Dictionary::new()
            .with("consistent", consistent)
            .with("momentumPredictor", momentum_predictor);
        if fluid {
            pimple.insert("turbOnFinalIterOnly", "false");
        }
        pimple.insert("nNonOrthogonalCorrectors", 0);
        if fluid {
            pimple.insert("nCorrectors", self.word(keys::NUMBER_OF_CORRECTORS)?);
        }
        if !multi_region {
            pimple.insert(
                "nOuterCorrectors",
                self.word(keys::MAX_ITERATIONS_PER_TIME_STEP)?,
            );
        }
        pimple.insert("maxCo", self.word(keys::MAX_COURANT_NUMBER)?);
        pimple.insert("nonOrthogonalityThreshold", 80);
        pimple.insert("skewnessThreshold", 0.95);
        if fluid {
            pimple.insert("pRefPoint", self.reference_point()?);
            pimple.insert("pRefValue", self.word(keys::REFERENCE_PRESSURE)?);
        }
        pimple.insert("rDeltaTSmoothingCoeff", 0.05);
        pimple.insert("rDeltaTDampingCoeff", 0.5);
        pimple.insert("solveEnergy", yes_no(energy));
        pimple.insert("residualControl", self.residual_control(energy, true)?);

        Ok(Dictionary::new()
            .with("solvers", self.solvers(region.phase)?)
            .with("SIMPLE", simple)
            .with("PIMPLE", pimple)
            .with("relaxationFactors", self.relaxation_factors()?))
    }

    fn solvers(&self, phase: Phase) -> Result<Dictionary, BuildError> {
        let pressure = if self.compressible()? {
            Arc::new(solver("PBiCGStab", "DILU"))
        } else {
            Arc::new(solver("PCG", gamg("DIC")))
        };
        let p_rgh = Arc::new(solver("PCG", gamg("DIC")));
        let enthalpy = Arc::new(solver(
            "PBiCGStab",
            gamg(match phase {
                Phase::Solid => "DIC",
                Phase::Fluid => "DILU",
            }),
        ));
        let rho = Arc::new(solver("PCG", "DIC"));
        let transport = Arc::new(solver("PBiCGStab", "DILU"));

        let mut solvers = Dictionary::new();
        for (name, block) in [
            ("\"(p|pcorr)", pressure),
            ("p_rgh", p_rgh),
            ("h", enthalpy),
            ("rho", rho),
            ("\"(U|k|epsilon|omega|nuTilda)", transport),
        ] {
            // Regex keys close their quote after the `Final` suffix.
            let (key, final_key) = if name.starts_with('"') {
                (format!("{name}\""), format!("{name}Final\""))
            } else {
                (name.to_string(), format!("{name}Final"))
            };
            solvers.insert(key, block.clone());
            solvers.insert(final_key, block);
        }
        Ok(solvers)
    }

    fn residual_control(&self, energy: bool, with_relative: bool) -> Result<Dictionary, BuildError> {
        let mut control = Dictionary::new();
        for (key, criterion) in [
            ("p", "pressure"),
            ("p_rgh", "pressure"),
            ("U", "momentum"),
            ("h", "energy"),
            (TURBULENCE_FIELDS, "turbulence"),
        ] {
            if key == "h" && !energy {
                continue;
            }
            let absolute = self.word(&format!("{}/{criterion}/absolute", keys::CONVERGENCE))?;
            if with_relative {
                let relative =
                    self.word(&format!("{}/{criterion}/relative", keys::CONVERGENCE))?;
                control.insert(
                    key,
                    Dictionary::new()
                        .with("tolerance", absolute)
                        .with("relTol", relative),
                );
            } else {
                control.insert(key, absolute);
            }
        }
        Ok(control)
    }

    fn relaxation_factors(&self) -> Result<Dictionary, BuildError> {
        let factor = |name: &str| self.word(&format!("{}/{name}", keys::UNDER_RELAXATION));

        let fields = Dictionary::new()
            .with("p", factor("pressure")?)
            .with("pFinal", factor("pressureFinal")?)
            .with("p_rgh", factor("pressure")?)
            .with("p_rghFinal", factor("pressureFinal")?)
            .with("rho", factor("density")?)
            .with("rhoFinal", factor("densityFinal")?);
        let equations = Dictionary::new()
            .with("U", factor("momentum")?)
            .with("UFinal", factor("momentumFinal")?)
            .with("h", factor("energy")?)
            .with("hFinal", factor("energyFinal")?)
            .with(TURBULENCE_FIELDS, factor("turbulence")?)
            .with(
                "\"(k|epsilon|omega|nuTilda)Final\"",
                factor("turbulenceFinal")?,
            );

        Ok(Dictionary::new()
            .with("fields", fields)
            .with("equations", equations))
    }

    fn reference_point(&self) -> Result<Value, BuildError> {
        require_vector(self.db, keys::REFERENCE_PRESSURE_LOCATION).map(Value::vector)
    }

    fn compressible(&self) -> Result<bool, BuildError> {
        let raw = require(self.db, keys::FLOW_TYPE)?;
        match raw.as_str() {
            "compressible" => Ok(true),
            "incompressible" => Ok(false),
            _ => Err(BuildError::InvalidValue {
                path: keys::FLOW_TYPE.to_string(),
                value: raw,
            }),
        }
    }

    fn energy_on(&self) -> Result<bool, BuildError> {
        let raw = require(self.db, keys::ENERGY_MODEL)?;
        match raw.as_str() {
            "on" => Ok(true),
            "off" => Ok(false),
            _ => Err(BuildError::InvalidValue {
                path: keys::ENERGY_MODEL.to_string(),
                value: raw,
            }),
        }
    }
}

impl DocumentBuilder for FvSolutionBuilder<'_> {
    fn construct(&self, _aux: &dyn AuxSink) -> Result<Option<FoamDocument>, BuildError> {
        let document = match self.target {
            Target::Global => FoamDocument {
                header: FoamHeader::dictionary("system", OBJECT),
                body: Dictionary::new().with(
                    "PIMPLE",
                    Dictionary::new().with(
                        "nOuterCorrectors",
                        self.word(keys::MAX_ITERATIONS_PER_TIME_STEP)?,
                    ),
                ),
            },
            Target::Region {
                region,
                multi_region,
            } => FoamDocument {
                header: FoamHeader::dictionary(region_location("system", &region.name), OBJECT),
                body: self.build_region(region, multi_region)?,
            },
        };
        debug!(location = %document.header.location, "built fvSolution");
        Ok(Some(document))
    }
}

/// Linear solver block with fixed tolerances.
fn solver(name: &str, preconditioner: impl Into<Value>) -> Dictionary {
    Dictionary::new()
        .with("solver", name)
        .with("preconditioner", preconditioner)
        .with("tolerance", "1e-16")
        .with("relTol", "0.1")
        .with("minIter", "1")
        .with("maxIter", "5")
}

fn gamg(smoother: &str) -> Dictionary {
    Dictionary::new()
        .with("preconditioner", "GAMG")
        .with("smoother", smoother)
        .with("tolerance", "1e-5")
        .with("relTol", "0.1")
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

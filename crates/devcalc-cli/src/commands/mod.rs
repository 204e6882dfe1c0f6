pub mod development;

//! Prints the CRD manifests as a multi-document YAML stream.

use crds::{NetworkInterface, PrivateNetwork};
use kube::CustomResourceExt;

fn main() -> anyhow::Result<()> {
    print!("{}", serde_yaml::to_string(&NetworkInterface::crd())?);
    println!("---");
    print!("{}", serde_yaml::to_string(&PrivateNetwork::crd())?);
    Ok(())
}

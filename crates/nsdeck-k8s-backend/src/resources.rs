use k8s_openapi::api::core::v1::Pod;

use crate::types::ResourceUsage;

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;
const GIB: u64 = 1024 * MIB;

/// Integer prefix of a quantity string ("250m" -> 250, "1.5" -> 1).
fn leading_integer(value: &str) -> Option<u64> {
    let value = value.trim();
    let digits = value
        .find(|c: char| !c.is_ascii_digit())
        .map_or(value, |end| &value[..end]);

    digits.parse::<u64>().ok()
}

/// CPU quantity in millicores. `m` suffixed values are millicores, anything
/// else is a whole core count.
pub fn parse_cpu_millis(cpu: &str) -> Option<u64> {
    match cpu.trim().strip_suffix('m') {
        Some(millis) => leading_integer(millis),
        None => leading_integer(cpu).and_then(|cores| cores.checked_mul(1000)),
    }
}

/// CPU quantity in cores.
pub fn parse_cpu(cpu: &str) -> Option<f64> {
    parse_cpu_millis(cpu).map(|millis| millis as f64 / 1000.0)
}

/// Memory quantity in bytes. Understands the `Ki`, `Mi` and `Gi` suffixes;
/// anything else is read as a plain byte count.
pub fn parse_memory(memory: &str) -> Option<u64> {
    let memory = memory.trim();

    if let Some(value) = memory.strip_suffix("Ki") {
        leading_integer(value).and_then(|n| n.checked_mul(KIB))
    } else if let Some(value) = memory.strip_suffix("Mi") {
        leading_integer(value).and_then(|n| n.checked_mul(MIB))
    } else if let Some(value) = memory.strip_suffix("Gi") {
        leading_integer(value).and_then(|n| n.checked_mul(GIB))
    } else {
        leading_integer(memory)
    }
}

/// Sum the cpu and memory *requests* of every container of every pod.
/// Missing or unreadable requests count as zero.
pub fn aggregate_resource_usage(pods: &[Pod]) -> ResourceUsage {
    let mut total_cpu_millis: u64 = 0;
    let mut total_memory_bytes: u64 = 0;

    let containers = pods
        .iter()
        .filter_map(|pod| pod.spec.as_ref())
        .flat_map(|spec| spec.containers.iter());

    for container in containers {
        let Some(requests) = container
            .resources
            .as_ref()
            .and_then(|resources| resources.requests.as_ref())
        else {
            continue;
        };

        if let Some(cpu) = requests.get("cpu") {
            match parse_cpu_millis(&cpu.0) {
                Some(millis) => total_cpu_millis = total_cpu_millis.saturating_add(millis),
                None => tracing::debug!(
                    "Ignoring unreadable cpu request {:?} on container {}",
                    cpu.0,
                    container.name
                ),
            }
        }
        if let Some(memory) = requests.get("memory") {
            match parse_memory(&memory.0) {
                Some(bytes) => total_memory_bytes = total_memory_bytes.saturating_add(bytes),
                None => tracing::debug!(
                    "Ignoring unreadable memory request {:?} on container {}",
                    memory.0,
                    container.name
                ),
            }
        }
    }

    ResourceUsage::from_totals(total_cpu_millis, total_memory_bytes)
}

// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `crd.rs`

#[cfg(test)]
mod tests {
    use super::super::*;
    use kube::CustomResourceExt;

    #[test]
    fn test_global_accelerator_deserializes_full_spec() {
        let yaml = r#"
apiVersion: aga.k8s.aws/v1beta1
kind: GlobalAccelerator
metadata:
  name: web
  namespace: shop
spec:
  name: web-accel
  ipAddressType: DUAL_STACK
  tags:
    team: payments
  listeners:
    - protocol: UDP
      portRanges:
        - fromPort: 53
          toPort: 53
      clientAffinity: SOURCE_IP
      endpointGroups:
        - region: eu-west-1
          trafficDialPercentage: 50
          portOverrides:
            - listenerPort: 53
              endpointPort: 5353
          endpoints:
            - type: EndpointID
              endpointID: arn:aws:elasticloadbalancing:eu-west-1:123456789012:loadbalancer/net/dns/abc
              weight: 10
              clientIPPreservationEnabled: true
            - type: Service
              name: dns
              namespace: infra
"#;
        let ga: GlobalAccelerator = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(ga.spec.name.as_deref(), Some("web-accel"));
        assert_eq!(ga.spec.ip_address_type, Some(IpAddressType::DualStack));

        let listener = &ga.spec.listeners.as_ref().unwrap()[0];
        assert_eq!(listener.protocol, Some(Protocol::Udp));
        assert_eq!(listener.client_affinity, Some(ClientAffinity::SourceIp));
        assert_eq!(
            listener.port_ranges.as_deref(),
            Some(&[PortRange::single(53)][..])
        );

        let group = &listener.endpoint_groups.as_ref().unwrap()[0];
        assert_eq!(group.traffic_dial_percentage, Some(50));
        assert_eq!(
            group.port_overrides.as_deref(),
            Some(
                &[PortOverride {
                    listener_port: 53,
                    endpoint_port: 5353
                }][..]
            )
        );

        let endpoints = group.endpoints.as_ref().unwrap();
        assert_eq!(endpoints[0].r#type, EndpointType::EndpointId);
        assert!(endpoints[0].endpoint_id.as_deref().unwrap().ends_with("/abc"));
        assert_eq!(endpoints[0].weight, Some(10));
        assert_eq!(endpoints[0].client_ip_preservation_enabled, Some(true));
        assert_eq!(endpoints[1].r#type, EndpointType::Service);
        assert_eq!(endpoints[1].namespace.as_deref(), Some("infra"));
    }

    #[test]
    fn test_global_accelerator_minimal_spec_defaults() {
        let yaml = r"
apiVersion: aga.k8s.aws/v1beta1
kind: GlobalAccelerator
metadata:
  name: web
  namespace: shop
spec: {}
";
        let ga: GlobalAccelerator = serde_yaml::from_str(yaml).unwrap();
        assert!(ga.spec.name.is_none());
        assert!(ga.spec.ip_address_type.is_none());
        assert!(ga.spec.listeners.is_none());
        assert!(ga.status.is_none());
    }

    #[test]
    fn test_protocol_display_matches_wire_format() {
        assert_eq!(Protocol::Tcp.to_string(), "TCP");
        assert_eq!(Protocol::Udp.to_string(), "UDP");
        assert_eq!(
            serde_json::to_value(Protocol::Udp).unwrap(),
            serde_json::json!("UDP")
        );
        assert_eq!(IpAddressType::DualStack.to_string(), "DUAL_STACK");
    }

    #[test]
    fn test_gateway_status_addresses_deserialize() {
        let gateway: Gateway = serde_json::from_value(serde_json::json!({
            "apiVersion": "gateway.networking.k8s.io/v1",
            "kind": "Gateway",
            "metadata": { "name": "public", "namespace": "edge" },
            "spec": {
                "gatewayClassName": "aws-nlb",
                "listeners": [
                    { "name": "dns", "port": 53, "protocol": "UDP" },
                    { "name": "https", "port": 443, "protocol": "HTTPS" }
                ]
            },
            "status": {
                "addresses": [
                    { "type": "IPAddress", "value": "10.0.0.1" },
                    { "type": "Hostname", "value": "public-abc.elb.us-west-2.amazonaws.com" }
                ]
            }
        }))
        .unwrap();

        assert_eq!(gateway.spec.listeners.len(), 2);
        let status = gateway.status.unwrap();
        assert_eq!(status.addresses[1].r#type.as_deref(), Some("Hostname"));
    }

    #[test]
    fn test_crd_names() {
        let crd = GlobalAccelerator::crd();
        assert_eq!(
            crd.metadata.name.as_deref(),
            Some("globalaccelerators.aga.k8s.aws")
        );
        assert_eq!(crd.spec.scope, "Namespaced");
        assert_eq!(crd.spec.group, crate::constants::API_GROUP);
        assert_eq!(crd.spec.versions[0].name, crate::constants::API_VERSION);

        let params = IngressClassParams::crd();
        assert_eq!(params.spec.scope, "Cluster");
    }
}

//! High-level controller interface

use std::net::{IpAddr, SocketAddr};

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use doorctl_core::{bcd, Frame, Function, ResponseKind};
use doorctl_transport::{Exchange, UdpExchange};
use doorctl_types::{
    AccessRecord, ControllerStatus, DoorControl, EventServer, Privilege,
};

use crate::error::{Error, Result};

/// Identification bytes guarding destructive or device-resetting
/// commands against stray packets
const MAGIC: [u8; 4] = [0x55, 0xAA, 0xAA, 0x55];

/// One door access controller
///
/// Carries the device identity and endpoint explicitly; nothing is
/// read from ambient state, and no connection is held. Every operation
/// is a one-shot exchange. Callers should serialize operations against
/// a single device.
///
/// # Examples
///
/// ```no_run
/// use doorctl::Controller;
///
/// #[tokio::main]
/// async fn main() -> doorctl::Result<()> {
///     let controller = Controller::new(423187757, "192.168.1.100".parse().unwrap());
///
///     let status = controller.status().await?;
///     println!("clock: {}", status.clock);
///
///     controller.open_door(1).await?;
///     Ok(())
/// }
/// ```
pub struct Controller {
    device_serial: u32,
    addr: SocketAddr,
    exchange: Box<dyn Exchange>,
}

impl Controller {
    /// Create a controller handle on the default port
    pub fn new(device_serial: u32, ip: IpAddr) -> Self {
        Self::with_addr(device_serial, SocketAddr::new(ip, doorctl_core::DEFAULT_PORT))
    }

    /// Create a controller handle with an explicit port
    pub fn with_addr(device_serial: u32, addr: SocketAddr) -> Self {
        Self {
            device_serial,
            addr,
            exchange: Box::new(UdpExchange::new()),
        }
    }

    /// Replace the exchange (custom timeouts, or a test double)
    pub fn with_exchange(mut self, exchange: Box<dyn Exchange>) -> Self {
        self.exchange = exchange;
        self
    }

    /// Device serial number this handle addresses
    pub fn device_serial(&self) -> u32 {
        self.device_serial
    }

    /// Network endpoint this handle addresses
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    // Network management

    /// Reconfigure the controller's IP address, mask and gateway
    ///
    /// The controller restarts immediately and never replies; the send
    /// completing is the only confirmation. Re-run discovery afterwards
    /// to verify the new address took effect.
    pub async fn set_address(
        &self,
        ip: std::net::Ipv4Addr,
        mask: std::net::Ipv4Addr,
        gateway: std::net::Ipv4Addr,
    ) -> Result<()> {
        let mut payload = vec![0u8; 16];
        payload[0..4].copy_from_slice(&ip.octets());
        payload[4..8].copy_from_slice(&mask.octets());
        payload[8..12].copy_from_slice(&gateway.octets());
        payload[12..16].copy_from_slice(&MAGIC);

        let frame = Frame::with_payload(Function::SetAddress, self.device_serial, payload)?;

        warn!(
            serial = self.device_serial,
            %ip,
            "sending address change; controller will restart"
        );
        self.exchange.send_only(&frame, self.addr).await?;

        Ok(())
    }

    // Controller state

    /// Query the controller's status: last access record, door
    /// sensor/button state, error flag and on-board clock
    pub async fn status(&self) -> Result<ControllerStatus> {
        let reply = self.query(Function::QueryStatus, Vec::new()).await?;
        Ok(ControllerStatus::from_payload(&reply.payload_bytes())?)
    }

    /// Read the controller's clock
    pub async fn read_time(&self) -> Result<NaiveDateTime> {
        let reply = self.query(Function::ReadTime, Vec::new()).await?;
        Ok(bcd::decode_datetime(&reply.payload_bytes()[..7])?)
    }

    /// Set the controller's clock; returns the time the device echoed
    pub async fn set_time(&self, time: &NaiveDateTime) -> Result<NaiveDateTime> {
        let payload = bcd::encode_datetime(time)?;
        let reply = self.query(Function::SetTime, payload.to_vec()).await?;

        let echoed = bcd::decode_datetime(&reply.payload_bytes()[..7])?;
        info!(serial = self.device_serial, %echoed, "clock set");
        Ok(echoed)
    }

    // Doors

    /// Remotely release one door (1-4)
    pub async fn open_door(&self, door: u8) -> Result<()> {
        validate_door(door)?;
        self.command(Function::OpenDoor, vec![door]).await
    }

    /// Set one door's control parameters
    ///
    /// The controller acknowledges by echoing the parameters; a reply
    /// for a different door means the command was not applied.
    pub async fn set_door_control(&self, control: &DoorControl) -> Result<DoorControl> {
        let reply = self
            .query(Function::SetDoorControl, control.encode().to_vec())
            .await?;

        let echoed = DoorControl::decode(&reply.payload_bytes())?;
        if echoed.door != control.door {
            return Err(Error::Rejected {
                function: Function::SetDoorControl,
            });
        }

        Ok(echoed)
    }

    /// Read one door's control parameters
    pub async fn read_door_control(&self, door: u8) -> Result<DoorControl> {
        validate_door(door)?;
        let reply = self.query(Function::ReadDoorControl, vec![door]).await?;
        Ok(DoorControl::decode(&reply.payload_bytes())?)
    }

    // Privileges

    /// Add or overwrite a card privilege
    pub async fn add_privilege(&self, privilege: &Privilege) -> Result<()> {
        let payload = privilege.encode()?;
        self.command(Function::AddPrivilege, payload.to_vec()).await
    }

    /// Add a privilege into the controller's sorted store
    ///
    /// Faster for bulk loads when cards arrive in descending card
    /// number order; payload is identical to [`add_privilege`].
    ///
    /// [`add_privilege`]: Self::add_privilege
    pub async fn add_privilege_sorted(&self, privilege: &Privilege) -> Result<()> {
        let payload = privilege.encode()?;
        self.command(Function::AddPrivilegeSorted, payload.to_vec())
            .await
    }

    /// Delete one card's privilege
    pub async fn delete_privilege(&self, card_number: u32) -> Result<()> {
        self.command(
            Function::DeletePrivilege,
            card_number.to_le_bytes().to_vec(),
        )
        .await
    }

    /// Clear every stored privilege
    pub async fn clear_privileges(&self) -> Result<()> {
        self.command(Function::ClearPrivileges, MAGIC.to_vec()).await
    }

    /// Read how many privileges the controller stores
    pub async fn privilege_count(&self) -> Result<u32> {
        let reply = self.query(Function::PrivilegeCount, Vec::new()).await?;
        Ok(payload_u32(&reply))
    }

    /// Look up one card's privilege
    ///
    /// `Ok(None)` means the controller stores no privilege for this
    /// card (card-number 0 sentinel in the reply), not a failure.
    pub async fn query_privilege(&self, card_number: u32) -> Result<Option<Privilege>> {
        let reply = self
            .query(Function::QueryPrivilege, card_number.to_le_bytes().to_vec())
            .await?;
        Ok(Privilege::decode(&reply.payload_bytes())?)
    }

    /// Read the privilege at a store index (1-based)
    pub async fn privilege_at(&self, index: u32) -> Result<Option<Privilege>> {
        let reply = self
            .query(Function::PrivilegeAtIndex, index.to_le_bytes().to_vec())
            .await?;
        Ok(Privilege::decode(&reply.payload_bytes())?)
    }

    // Access records

    /// Read the access record at `index` (0xFFFFFFFF reads the newest)
    pub async fn get_record(&self, index: u32) -> Result<AccessRecord> {
        let reply = self
            .query(Function::GetRecord, index.to_le_bytes().to_vec())
            .await?;
        Ok(AccessRecord::from_payload(&reply.payload_bytes())?)
    }

    /// Move the controller's read-record cursor
    pub async fn set_record_index(&self, index: u32) -> Result<()> {
        let mut payload = index.to_le_bytes().to_vec();
        payload.extend_from_slice(&MAGIC);
        self.command(Function::SetRecordIndex, payload).await
    }

    /// Read the controller's read-record cursor
    pub async fn get_record_index(&self) -> Result<u32> {
        let reply = self.query(Function::GetRecordIndex, Vec::new()).await?;
        Ok(payload_u32(&reply))
    }

    // Event upload

    /// Enable or disable recording of door sensor/button events
    pub async fn record_special_events(&self, enable: bool) -> Result<()> {
        self.command(Function::RecordSpecialEvents, vec![enable as u8])
            .await
    }

    /// Configure where the controller pushes access events
    pub async fn set_event_server(&self, server: &EventServer) -> Result<()> {
        self.command(Function::SetEventServer, server.encode().to_vec())
            .await
    }

    /// Read the configured event receiving server
    pub async fn read_event_server(&self) -> Result<EventServer> {
        let reply = self.query(Function::ReadEventServer, Vec::new()).await?;
        Ok(EventServer::decode(&reply.payload_bytes())?)
    }

    // Helper methods

    /// One exchange whose reply must echo the request's function id
    async fn query(&self, function: Function, payload: Vec<u8>) -> Result<Frame> {
        debug_assert!(function.expects_reply());

        let frame = Frame::with_payload(function, self.device_serial, payload)?;

        debug!(serial = self.device_serial, %function, "request");
        let reply = self.exchange.request(&frame, self.addr).await?;

        if reply.function != function {
            return Err(Error::UnexpectedReply {
                expected: function,
                actual: reply.function,
            });
        }

        Ok(reply)
    }

    /// An exchange whose reply carries the ack flag in payload byte 0
    async fn command(&self, function: Function, payload: Vec<u8>) -> Result<()> {
        debug_assert_eq!(function.response_kind(), ResponseKind::AckFlag);

        let reply = self.query(function, payload).await?;

        if reply.is_acked() {
            debug!(serial = self.device_serial, %function, "acknowledged");
            Ok(())
        } else {
            Err(Error::Rejected { function })
        }
    }
}

fn validate_door(door: u8) -> Result<()> {
    if !(1..=4).contains(&door) {
        return Err(doorctl_types::Error::Validation(format!(
            "door number {} out of range 1-4",
            door
        ))
        .into());
    }
    Ok(())
}

fn payload_u32(reply: &Frame) -> u32 {
    let payload = reply.payload_bytes();
    u32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use doorctl_types::Doors;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Scripted exchange: pops one canned reply per request and records
    /// every frame that would have hit the wire
    #[derive(Clone, Default)]
    struct FakeExchange {
        replies: Arc<Mutex<VecDeque<Frame>>>,
        sent: Arc<Mutex<Vec<Frame>>>,
    }

    impl FakeExchange {
        fn reply_with(self, frame: Frame) -> Self {
            self.replies.lock().unwrap().push_back(frame);
            self
        }

        fn sent_frames(&self) -> Vec<Frame> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Exchange for FakeExchange {
        async fn request(
            &self,
            frame: &Frame,
            target: SocketAddr,
        ) -> doorctl_transport::Result<Frame> {
            self.sent.lock().unwrap().push(frame.clone());
            self.replies.lock().unwrap().pop_front().ok_or(
                doorctl_transport::Error::Timeout {
                    target,
                    attempts: 1,
                    elapsed: std::time::Duration::from_millis(0),
                },
            )
        }

        async fn send_only(
            &self,
            frame: &Frame,
            _target: SocketAddr,
        ) -> doorctl_transport::Result<()> {
            self.sent.lock().unwrap().push(frame.clone());
            Ok(())
        }
    }

    const SERIAL: u32 = 423187757;

    fn controller(fake: &FakeExchange) -> Controller {
        Controller::new(SERIAL, "192.168.1.100".parse().unwrap())
            .with_exchange(Box::new(fake.clone()))
    }

    fn reply(function: Function, payload: Vec<u8>) -> Frame {
        Frame::with_payload(function, SERIAL, payload).unwrap()
    }

    #[tokio::test]
    async fn test_open_door_acked() {
        let fake = FakeExchange::default().reply_with(reply(Function::OpenDoor, vec![1]));

        controller(&fake).open_door(3).await.unwrap();

        let sent = fake.sent_frames();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].function, Function::OpenDoor);
        assert_eq!(sent[0].payload_bytes()[0], 3);
    }

    #[tokio::test]
    async fn test_open_door_rejected() {
        let fake = FakeExchange::default().reply_with(reply(Function::OpenDoor, vec![0]));

        let result = controller(&fake).open_door(1).await;
        assert!(matches!(
            result,
            Err(Error::Rejected {
                function: Function::OpenDoor
            })
        ));
    }

    #[tokio::test]
    async fn test_open_door_validates_number() {
        let fake = FakeExchange::default();
        let result = controller(&fake).open_door(5).await;

        assert!(matches!(result, Err(Error::Types(_))));
        assert!(fake.sent_frames().is_empty());
    }

    #[tokio::test]
    async fn test_mismatched_reply_function() {
        let fake = FakeExchange::default().reply_with(reply(Function::ReadTime, vec![1]));

        let result = controller(&fake).privilege_count().await;
        assert!(matches!(
            result,
            Err(Error::UnexpectedReply {
                expected: Function::PrivilegeCount,
                actual: Function::ReadTime
            })
        ));
    }

    #[tokio::test]
    async fn test_privilege_roundtrip_through_query() {
        let privilege = Privilege::new(
            12345,
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
            Doors::DOOR1 | Doors::DOOR3,
        );

        // The controller's query reply reuses the add-privilege layout
        let fake = FakeExchange::default().reply_with(reply(
            Function::QueryPrivilege,
            privilege.encode().unwrap().to_vec(),
        ));

        let found = controller(&fake).query_privilege(12345).await.unwrap();
        let found = found.expect("privilege should be present");

        assert_eq!(found.card_number, 12345);
        assert_eq!(found.start, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert_eq!(found.end, NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
        assert!(found.doors.has_door(1));
        assert!(!found.doors.has_door(2));
        assert!(found.doors.has_door(3));
        assert!(!found.doors.has_door(4));
    }

    #[tokio::test]
    async fn test_query_privilege_not_found() {
        let fake =
            FakeExchange::default().reply_with(reply(Function::QueryPrivilege, vec![0u8; 32]));

        let found = controller(&fake).query_privilege(99999).await.unwrap();
        assert_eq!(found, None);
    }

    #[tokio::test]
    async fn test_set_door_control_echo_match() {
        let control =
            DoorControl::new(2, doorctl_types::ControlMethod::Online, 10).unwrap();
        let fake = FakeExchange::default().reply_with(reply(
            Function::SetDoorControl,
            control.encode().to_vec(),
        ));

        let echoed = controller(&fake).set_door_control(&control).await.unwrap();
        assert_eq!(echoed, control);
    }

    #[tokio::test]
    async fn test_set_door_control_echo_mismatch() {
        let control =
            DoorControl::new(2, doorctl_types::ControlMethod::Online, 10).unwrap();
        let other = DoorControl::new(3, doorctl_types::ControlMethod::Online, 10).unwrap();
        let fake = FakeExchange::default()
            .reply_with(reply(Function::SetDoorControl, other.encode().to_vec()));

        let result = controller(&fake).set_door_control(&control).await;
        assert!(matches!(result, Err(Error::Rejected { .. })));
    }

    #[tokio::test]
    async fn test_set_address_is_fire_and_forget() {
        let fake = FakeExchange::default(); // No reply scripted

        controller(&fake)
            .set_address(
                "192.168.1.150".parse().unwrap(),
                "255.255.255.0".parse().unwrap(),
                "192.168.1.1".parse().unwrap(),
            )
            .await
            .unwrap();

        let sent = fake.sent_frames();
        assert_eq!(sent.len(), 1);
        let payload = sent[0].payload_bytes();
        assert_eq!(&payload[0..4], &[192, 168, 1, 150]);
        assert_eq!(&payload[12..16], &MAGIC);
    }

    #[tokio::test]
    async fn test_set_record_index_payload() {
        let fake = FakeExchange::default().reply_with(reply(Function::SetRecordIndex, vec![1]));

        controller(&fake).set_record_index(1289).await.unwrap();

        let sent = fake.sent_frames();
        let payload = sent[0].payload_bytes();
        assert_eq!(u32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]), 1289);
        assert_eq!(&payload[4..8], &MAGIC);
    }

    #[tokio::test]
    async fn test_read_time() {
        let fake = FakeExchange::default().reply_with(reply(
            Function::ReadTime,
            vec![0x20, 0x25, 0x06, 0x15, 0x13, 0x59, 0x58],
        ));

        let time = controller(&fake).read_time().await.unwrap();
        assert_eq!(
            time,
            NaiveDate::from_ymd_opt(2025, 6, 15)
                .unwrap()
                .and_hms_opt(13, 59, 58)
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_set_time_returns_echo() {
        let time = NaiveDate::from_ymd_opt(2025, 6, 15)
            .unwrap()
            .and_hms_opt(13, 59, 58)
            .unwrap();
        let fake = FakeExchange::default().reply_with(reply(
            Function::SetTime,
            bcd::encode_datetime(&time).unwrap().to_vec(),
        ));

        let echoed = controller(&fake).set_time(&time).await.unwrap();
        assert_eq!(echoed, time);
    }

    #[tokio::test]
    async fn test_privilege_count() {
        let fake = FakeExchange::default()
            .reply_with(reply(Function::PrivilegeCount, 27u32.to_le_bytes().to_vec()));

        let count = controller(&fake).privilege_count().await.unwrap();
        assert_eq!(count, 27);
    }

    #[tokio::test]
    async fn test_timeout_propagates() {
        let fake = FakeExchange::default(); // No reply scripted

        let result = controller(&fake).read_time().await;
        assert!(matches!(
            result,
            Err(Error::Transport(doorctl_transport::Error::Timeout { .. }))
        ));
    }
}

//! Profile command handlers.

use anyhow::Result;
use khetsetu_core::api::ProfileUpdate;

use super::build_session;
use crate::cli::FarmArgs;

pub async fn show() -> Result<()> {
    let mut session = build_session()?;
    session.check_auth().await;

    let Some(user) = &session.state().user else {
        println!("Not logged in.");
        return Ok(());
    };

    println!("{} <{}>", user.name, user.email);
    if let Some(phone) = &user.phone {
        println!("Phone: {phone}");
    }
    if let Some(role) = &user.role {
        println!("Role: {role}");
    }

    if let Some(farm) = &user.profile {
        if let Some(village) = &farm.village {
            println!("Village: {village}");
        }
        if let Some(district) = &farm.district {
            println!("District: {district}");
        }
        if let Some(state) = &farm.state {
            println!("State: {state}");
        }
        if let Some(acres) = farm.land_size_acres {
            println!("Land: {acres} acres");
        }
        if let Some(soil) = &farm.soil_type {
            println!("Soil: {soil}");
        }
        if let Some(irrigation) = &farm.irrigation_source {
            println!("Irrigation: {irrigation}");
        }
        if !farm.primary_crops.is_empty() {
            println!("Crops: {}", farm.primary_crops.join(", "));
        }
    }
    Ok(())
}

pub async fn update(name: Option<String>, phone: Option<String>, farm: FarmArgs) -> Result<()> {
    if name.is_none() && phone.is_none() && farm.is_empty() {
        anyhow::bail!("Nothing to update — pass at least one field");
    }

    let update = ProfileUpdate {
        name,
        phone,
        profile: farm.into_profile(),
    };

    let mut session = build_session()?;
    session.check_auth().await;
    if !session.state().is_authenticated {
        anyhow::bail!("Not logged in");
    }

    let user = session.update_profile(&update).await?;
    println!("Profile updated for {} <{}>", user.name, user.email);
    Ok(())
}
